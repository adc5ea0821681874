use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenError, TokenKind};
use crate::error::ApiError;

/// Extracts and validates the bearer JWT, returning the caller's user ID.
///
/// Handlers that take this extractor never run for unauthenticated requests:
/// the rejection is a 401 with a `{msg}` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("No token, authorization denied".into()))?;

        // Expect "Bearer <token>"
        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthenticated("Invalid Authorization header".into()))?;

        let claims = keys
            .verify_kind(token.trim(), TokenKind::Access)
            .map_err(|e| {
                warn!(error = %e, "bearer token rejected");
                match e {
                    TokenError::WrongKind { .. } => {
                        ApiError::Unauthenticated("Access token required".into())
                    }
                    TokenError::Invalid(_) => ApiError::Unauthenticated("Token is not valid".into()),
                }
            })?;

        Ok(AuthUser(claims.sub))
    }
}
