use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api::auth::AdminUser;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::{TransactionQuery, TransactionResponse};
use crate::domain::TransactionStatus;

/// GET /api/admin/transactions
///
/// Defaults to the pending queue; `?status=` filters by any state.
pub async fn list_transaction_queue(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<TransactionQuery>,
) -> std::result::Result<Json<Vec<TransactionResponse>>, ApiError> {
    let status = match query.status.as_deref() {
        Some(raw) => TransactionStatus::try_from(raw).map_err(ApiError::bad_request)?,
        None => TransactionStatus::Pending,
    };
    let txs = state.store.list_transactions_by_status(status).await?;
    Ok(Json(txs.into_iter().map(Into::into).collect()))
}

/// POST /api/admin/transactions/:id/approve
pub async fn approve_transaction(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(tx_id): Path<i64>,
) -> std::result::Result<Json<TransactionResponse>, ApiError> {
    let receipt = state.engine.approve_transaction(admin.id, tx_id).await?;
    Ok(Json(receipt.transaction.into()))
}

/// POST /api/admin/transactions/:id/reject
pub async fn reject_transaction(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(tx_id): Path<i64>,
) -> std::result::Result<Json<TransactionResponse>, ApiError> {
    let receipt = state.engine.reject_transaction(admin.id, tx_id).await?;
    Ok(Json(receipt.transaction.into()))
}
