use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::auth::AdminUser;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::{
    BetResponse, CloseBetRequest, CreateBetRequest, CreateBetResponse, SettlementResponse,
};
use crate::engine::{NewBet, NewDetailBet, NewOutcome};
use crate::error::WagerError;

fn to_new_bet(req: CreateBetRequest) -> NewBet {
    NewBet {
        title: req.title,
        outcomes: req
            .outcomes
            .into_iter()
            .map(|o| NewOutcome {
                label: o.label,
                odds: o.odds,
            })
            .collect(),
        minimum_bet: req.minimum_bet,
        parent_bet_id: req.parent_bet_id,
        details: req
            .details
            .into_iter()
            .map(|d| NewDetailBet {
                title: d.title,
                outcomes: d
                    .outcomes
                    .into_iter()
                    .map(|o| NewOutcome {
                        label: o.label,
                        odds: o.odds,
                    })
                    .collect(),
                minimum_bet: d.minimum_bet,
            })
            .collect(),
    }
}

/// GET /api/bets
pub async fn list_bets(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<BetResponse>>, ApiError> {
    let bets = state.store.list_open_bets().await?;
    Ok(Json(bets.into_iter().map(Into::into).collect()))
}

/// GET /api/bets/:id
pub async fn get_bet(
    State(state): State<AppState>,
    Path(bet_id): Path<i64>,
) -> std::result::Result<Json<BetResponse>, ApiError> {
    let bet = state
        .store
        .get_bet(bet_id)
        .await?
        .ok_or(WagerError::BetNotFound { bet_id })?;
    Ok(Json(bet.into()))
}

/// POST /api/bets
pub async fn create_bet(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateBetRequest>,
) -> std::result::Result<Json<CreateBetResponse>, ApiError> {
    let bet_id = state.engine.create_bet(admin.id, &to_new_bet(req)).await?;
    Ok(Json(CreateBetResponse { bet_id }))
}

/// POST /api/bets/:id/close
pub async fn close_bet(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(bet_id): Path<i64>,
    Json(req): Json<CloseBetRequest>,
) -> std::result::Result<Json<SettlementResponse>, ApiError> {
    let report = state
        .engine
        .close_bet(bet_id, req.result_outcome_id)
        .await?;
    Ok(Json(report.into()))
}
