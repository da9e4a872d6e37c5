use axum::{extract::State, http::StatusCode, Json};

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::{AmountRequest, TransactionResponse, TransferRequest};

/// POST /api/wallet/deposits
pub async fn request_deposit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<AmountRequest>,
) -> std::result::Result<Json<TransactionResponse>, ApiError> {
    let tx = state.engine.request_deposit(user.id, req.amount).await?;
    Ok(Json(tx.into()))
}

/// POST /api/wallet/withdrawals
pub async fn request_withdrawal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<AmountRequest>,
) -> std::result::Result<Json<TransactionResponse>, ApiError> {
    let tx = state.engine.request_withdrawal(user.id, req.amount).await?;
    Ok(Json(tx.into()))
}

/// POST /api/wallet/transfers
///
/// Recipients are addressed by username; the id lookup happens here so the
/// response can name the missing account.
pub async fn request_transfer(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<TransferRequest>,
) -> std::result::Result<Json<TransactionResponse>, ApiError> {
    let recipient = state
        .store
        .get_user_by_username(&req.to_username)
        .await?
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                format!("no account named '{}'", req.to_username),
            )
        })?;
    let tx = state
        .engine
        .request_transfer(user.id, recipient.id, req.amount)
        .await?;
    Ok(Json(tx.into()))
}

/// GET /api/wallet/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> std::result::Result<Json<Vec<TransactionResponse>>, ApiError> {
    let txs = state.store.list_user_transactions(user.id).await?;
    Ok(Json(txs.into_iter().map(Into::into).collect()))
}
