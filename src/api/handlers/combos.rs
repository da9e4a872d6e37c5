use axum::{extract::State, Json};

use crate::api::auth::{AdminUser, AuthUser};
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::{ComboResponse, PlaceComboRequest, PlaceComboResponse, SweepResponse};
use crate::engine::ComboSelectionInput;

/// POST /api/combos
pub async fn place_combo(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<PlaceComboRequest>,
) -> std::result::Result<Json<PlaceComboResponse>, ApiError> {
    let selections: Vec<ComboSelectionInput> = req
        .selections
        .iter()
        .map(|s| ComboSelectionInput {
            bet_id: s.bet_id,
            outcome_id: s.outcome_id,
        })
        .collect();
    let receipt = state
        .engine
        .place_combo(user.id, &selections, req.stake)
        .await?;
    Ok(Json(receipt.into()))
}

/// GET /api/combos
pub async fn list_combos(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> std::result::Result<Json<Vec<ComboResponse>>, ApiError> {
    let combos = state.store.list_user_combos(user.id).await?;
    Ok(Json(combos.into_iter().map(Into::into).collect()))
}

/// POST /api/combos/sweep
pub async fn sweep_combos(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> std::result::Result<Json<SweepResponse>, ApiError> {
    let report = state.engine.sweep_combos().await?;
    Ok(Json(report.into()))
}
