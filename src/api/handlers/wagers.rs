use axum::{extract::State, Json};

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::{PlaceWagerRequest, PlaceWagerResponse, WagerHistoryResponse};

/// POST /api/wagers
pub async fn place_wager(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<PlaceWagerRequest>,
) -> std::result::Result<Json<PlaceWagerResponse>, ApiError> {
    let receipt = state
        .engine
        .place_bet(user.id, req.bet_id, req.outcome_id, req.stake)
        .await?;
    Ok(Json(receipt.into()))
}

/// GET /api/wagers
pub async fn list_wagers(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> std::result::Result<Json<Vec<WagerHistoryResponse>>, ApiError> {
    let wagers = state.store.list_user_wagers(user.id).await?;
    Ok(Json(wagers.into_iter().map(Into::into).collect()))
}
