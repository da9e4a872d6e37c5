use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::{
    CashoutResponse, RoundResponse, StartRoundRequest, StartRoundResponse, StepResponse,
};
use crate::domain::CasinoGame;

/// POST /api/casino/rounds
pub async fn start_round(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<StartRoundRequest>,
) -> std::result::Result<Json<StartRoundResponse>, ApiError> {
    let game = CasinoGame::try_from(req.game.as_str()).map_err(ApiError::bad_request)?;
    let receipt = state
        .engine
        .start_round(user.id, game, req.stake, req.pick)
        .await?;
    Ok(Json(receipt.into()))
}

/// POST /api/casino/rounds/:id/step
pub async fn step_round(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(round_id): Path<i64>,
) -> std::result::Result<Json<StepResponse>, ApiError> {
    let receipt = state.engine.step_round(user.id, round_id).await?;
    Ok(Json(receipt.into()))
}

/// POST /api/casino/rounds/:id/cashout
pub async fn cashout_round(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(round_id): Path<i64>,
) -> std::result::Result<Json<CashoutResponse>, ApiError> {
    let receipt = state.engine.cashout_round(user.id, round_id).await?;
    Ok(Json(receipt.into()))
}

/// GET /api/casino/rounds
pub async fn list_rounds(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> std::result::Result<Json<Vec<RoundResponse>>, ApiError> {
    let rounds = state.store.list_user_rounds(user.id).await?;
    Ok(Json(rounds.into_iter().map(Into::into).collect()))
}
