//! Session extractors for handlers.
//!
//! `AuthUser` resolves the bearer token to a live session; `AdminUser`
//! additionally requires the account's admin flag. Both reject before the
//! handler body runs, so no engine operation starts without a caller.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::auth;
use crate::domain::User;

/// Any authenticated account.
pub struct AuthUser(pub User);

/// An authenticated admin account.
pub struct AdminUser(pub User);

fn extract_bearer_token(raw: &str) -> Option<&str> {
    raw.strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .map(str::trim)
}

/// The session token carried by the request, if any.
pub(crate) fn bearer_uuid(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

async fn session_user(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let raw = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    let token =
        Uuid::parse_str(raw).map_err(|_| ApiError::unauthorized("malformed session token"))?;
    let user = auth::session_user(state.store.pool(), token).await?;
    user.ok_or_else(|| ApiError::unauthorized("unknown or expired session"))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = session_user(parts, state).await?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = session_user(parts, state).await?;
        if !user.is_admin {
            return Err(ApiError::forbidden("admin privileges required"));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::extract_bearer_token;

    #[test]
    fn bearer_prefix_is_case_tolerant_and_trimmed() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
