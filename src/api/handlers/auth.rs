use axum::{extract::State, http::HeaderMap, Json};
use tracing::info;

use crate::api::auth::{bearer_uuid, AuthUser};
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::{
    LoginRequest, LogoutResponse, RegisterRequest, SessionResponse, UserResponse,
};
use crate::auth;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> std::result::Result<Json<SessionResponse>, ApiError> {
    let starting_balance = state.engine.rules().starting_balance;
    let user = auth::register_user(
        state.store.pool(),
        &req.username,
        &req.password,
        starting_balance,
        false,
    )
    .await?;
    let token = auth::create_session(state.store.pool(), user.id).await?;

    Ok(Json(SessionResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> std::result::Result<Json<SessionResponse>, ApiError> {
    let creds = auth::verify_login(state.store.pool(), &req.username, &req.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid username or password"))?;

    let user = state
        .store
        .get_user(creds.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid username or password"))?;
    let token = auth::create_session(state.store.pool(), user.id).await?;
    info!(user_id = user.id, "session opened");

    Ok(Json(SessionResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
) -> std::result::Result<Json<LogoutResponse>, ApiError> {
    if let Some(token) = bearer_uuid(&headers) {
        auth::delete_session(state.store.pool(), token).await?;
    }
    Ok(Json(LogoutResponse { success: true }))
}

/// GET /api/me
pub async fn me(
    AuthUser(user): AuthUser,
) -> std::result::Result<Json<UserResponse>, ApiError> {
    Ok(Json(user.into()))
}
