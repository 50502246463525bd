use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

/// HS256 keys shared with the auth provider.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub audience: String,
    pub issuer: Option<String>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            audience: cfg.audience.clone(),
            issuer: cfg.issuer.clone(),
        }
    }

    /// Mints a token the way the auth provider does. Used by tests and local tooling.
    pub fn sign(&self, user_id: Uuid, email: Option<&str>, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            aud: self.audience.clone(),
            iss: self.issuer.clone(),
            email: email.map(str::to_owned),
            role: Some("authenticated".into()),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(std::slice::from_ref(issuer));
        }
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, audience: &str, issuer: Option<&str>) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            audience: audience.into(),
            issuer: issuer.map(Into::into),
        })
    }

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn sign_and_verify_round_trip() {
        let keys = make_keys("dev-secret", "authenticated", None);
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, Some("a@b.co"), TTL).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.aud, "authenticated");
        assert_eq!(claims.email.as_deref(), Some("a@b.co"));
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = make_keys("one", "authenticated", None)
            .sign(Uuid::new_v4(), None, TTL)
            .unwrap();
        assert!(make_keys("two", "authenticated", None).verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_audience() {
        let token = make_keys("s", "anon", None).sign(Uuid::new_v4(), None, TTL).unwrap();
        assert!(make_keys("s", "authenticated", None).verify(&token).is_err());
    }

    #[test]
    fn issuer_is_checked_only_when_configured() {
        let token = make_keys("s", "authenticated", Some("https://auth.example"))
            .sign(Uuid::new_v4(), None, TTL)
            .unwrap();
        assert!(make_keys("s", "authenticated", None).verify(&token).is_ok());
        assert!(make_keys("s", "authenticated", Some("https://other.example"))
            .verify(&token)
            .is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("s", "authenticated", None);
        let past = OffsetDateTime::now_utc().unix_timestamp() as usize - 3600;
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp: past,
            iat: past - 60,
            aud: "authenticated".into(),
            iss: None,
            email: None,
            role: None,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("s", "authenticated", None);
        assert!(keys.verify("undefined").is_err());
    }
}
