use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub audience: String,
    /// Checked only when set; the token issuer is usually the auth provider's URL.
    pub issuer: Option<String>,
}

/// Which backend serves the data store gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store = match get("DATA_STORE").as_deref() {
            None | Some("postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => anyhow::bail!("unknown DATA_STORE {other:?}"),
        };

        let database_url = get("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when DATA_STORE=postgres");
        }

        let jwt = JwtConfig {
            secret: get("JWT_SECRET").context("JWT_SECRET is required")?,
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "authenticated".into()),
            issuer: get("JWT_ISSUER"),
        };

        Ok(Self {
            store,
            database_url,
            max_connections: get("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: match get("APP_PORT") {
                Some(v) => v.parse().with_context(|| format!("invalid APP_PORT {v:?}"))?,
                None => 8000,
            },
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("parse bind address")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_for_postgres() {
        let cfg = load(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(cfg.store, StoreKind::Postgres);
        assert_eq!(cfg.jwt.audience, "authenticated");
        assert!(cfg.jwt.issuer.is_none());
        assert_eq!(cfg.max_connections, 10);
        assert_eq!(cfg.bind_addr().unwrap().port(), 8000);
    }

    #[test]
    fn postgres_requires_database_url() {
        let err = load(&[("JWT_SECRET", "s")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn memory_store_needs_no_database() {
        let cfg = load(&[("DATA_STORE", "memory"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(cfg.store, StoreKind::Memory);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn missing_secret_and_bad_values_are_errors() {
        assert!(load(&[("DATA_STORE", "memory")]).is_err());
        assert!(load(&[("DATA_STORE", "sqlite"), ("JWT_SECRET", "s")]).is_err());
        assert!(load(&[("DATA_STORE", "memory"), ("JWT_SECRET", "s"), ("APP_PORT", "x")]).is_err());
    }
}
