use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::{error::AppError, state::AppState, store::ScopedStore};

/// Extracts and validates the bearer JWT, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header"))?;

        let claims = keys.verify(token.trim()).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::unauthorized("Invalid or expired token")
        })?;

        Ok(AuthUser(claims.sub))
    }
}

/// Everything a handler needs about the caller: who they are and a store
/// handle that can only reach their rows.
pub struct RequestContext {
    pub user_id: Uuid,
    pub store: ScopedStore,
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        Ok(Self {
            user_id,
            store: ScopedStore::new(state.store.clone(), user_id),
        })
    }
}
