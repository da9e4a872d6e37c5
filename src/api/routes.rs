use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Auth endpoints
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/me", get(handlers::me))
        // Bet endpoints
        .route("/api/bets", get(handlers::list_bets).post(handlers::create_bet))
        .route("/api/bets/:id", get(handlers::get_bet))
        .route("/api/bets/:id/close", post(handlers::close_bet))
        // Wager endpoints
        .route("/api/wagers", post(handlers::place_wager).get(handlers::list_wagers))
        // Combo endpoints
        .route("/api/combos", post(handlers::place_combo).get(handlers::list_combos))
        .route("/api/combos/sweep", post(handlers::sweep_combos))
        // Wallet endpoints
        .route("/api/wallet/deposits", post(handlers::request_deposit))
        .route("/api/wallet/withdrawals", post(handlers::request_withdrawal))
        .route("/api/wallet/transfers", post(handlers::request_transfer))
        .route("/api/wallet/transactions", get(handlers::list_transactions))
        // Admin endpoints
        .route("/api/admin/transactions", get(handlers::list_transaction_queue))
        .route(
            "/api/admin/transactions/:id/approve",
            post(handlers::approve_transaction),
        )
        .route(
            "/api/admin/transactions/:id/reject",
            post(handlers::reject_transaction),
        )
        // Casino endpoints
        .route(
            "/api/casino/rounds",
            post(handlers::start_round).get(handlers::list_rounds),
        )
        .route("/api/casino/rounds/:id/step", post(handlers::step_round))
        .route("/api/casino/rounds/:id/cashout", post(handlers::cashout_round))
        // Quote endpoints
        .route("/api/quotes", get(handlers::quotes))
        // Health endpoint
        .route("/health", get(handlers::health))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
