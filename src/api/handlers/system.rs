use axum::{extract::State, Json};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::{HealthResponse, QuoteResponse};

/// GET /health
///
/// Always 200; a dead database shows up as `"db": "down"` so probes can
/// tell a sick process from a missing one.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_up = state.store.ping().await.is_ok();
    Json(HealthResponse {
        status: if db_up { "ok" } else { "degraded" }.to_string(),
        db: if db_up { "up" } else { "down" }.to_string(),
        uptime_secs: state.uptime_seconds(),
    })
}

/// GET /api/quotes
pub async fn quotes(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<QuoteResponse>>, ApiError> {
    let mut quotes = state.quotes.snapshot().await;
    quotes.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    Ok(Json(quotes.into_iter().map(Into::into).collect()))
}
