use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use super::jwt::JwtKeys;

/// Identity a verified token resolves to; handlers attach this to their own
/// request context.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub user_id: i64,
    pub email: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthHeaderError {
    #[error("token missing")]
    MissingToken,
    #[error("invalid token format")]
    MalformedHeader,
    #[error("invalid or expired token")]
    InvalidToken,
}

/// Pulls a `Bearer <token>` header apart and verifies the token. The token
/// is whatever follows the first space in the header value.
pub fn authenticate_header(
    keys: &JwtKeys,
    header: Option<&str>,
) -> Result<CurrentUser, AuthHeaderError> {
    let header = header.unwrap_or_default();
    if header.is_empty() {
        return Err(AuthHeaderError::MissingToken);
    }
    let (_, token) = header
        .split_once(' ')
        .ok_or(AuthHeaderError::MalformedHeader)?;
    if token.is_empty() {
        return Err(AuthHeaderError::MissingToken);
    }
    let claims = keys
        .verify(token)
        .map_err(|_| AuthHeaderError::InvalidToken)?;
    Ok(CurrentUser {
        user_id: claims.user_id,
        email: claims.email,
    })
}

/// Request guard: extracts and validates the bearer token.
pub struct AuthUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let user = authenticate_header(&keys, header).map_err(|e| {
            warn!(error = %e, "request rejected");
            (StatusCode::UNAUTHORIZED, e.to_string())
        })?;
        Ok(AuthUser(user))
    }
}
