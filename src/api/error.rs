//! Wire-level error envelope.
//!
//! Every handler failure turns into a JSON body `{ "error": CODE,
//! "message": text }` with a status derived from the error class:
//! validation 400, state conflicts 409, missing resources 404. Internal
//! failures are logged and surfaced without detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::{PuntError, WagerError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<PuntError> for ApiError {
    fn from(err: PuntError) -> Self {
        match err {
            PuntError::Wager(w) => ApiError::new(wager_status(&w), w.code(), w.to_string()),
            PuntError::Validation(msg) => ApiError::bad_request(msg),
            PuntError::Unauthorized(msg) => ApiError::unauthorized(msg),
            PuntError::Forbidden(msg) => ApiError::forbidden(msg),
            err if err.is_retryable() => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "RETRY",
                "transient database contention, retry the request",
            ),
            err => {
                error!("internal error: {}", err);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "internal server error",
                )
            }
        }
    }
}

impl From<WagerError> for ApiError {
    fn from(err: WagerError) -> Self {
        PuntError::from(err).into()
    }
}

fn wager_status(err: &WagerError) -> StatusCode {
    match err {
        // Validation, raised before any lock
        WagerError::InvalidAmount { .. }
        | WagerError::BelowMinimum { .. }
        | WagerError::InvalidTitle
        | WagerError::InvalidOutcomes(_)
        | WagerError::TooFewSelections { .. }
        | WagerError::InvalidPick(_) => StatusCode::BAD_REQUEST,

        // State conflicts, raised under lock
        WagerError::InsufficientFunds { .. }
        | WagerError::BetNotOpen { .. }
        | WagerError::AlreadyClosed { .. }
        | WagerError::SelectionUnavailable { .. }
        | WagerError::AlreadyProcessed { .. }
        | WagerError::RoundNotActive { .. }
        | WagerError::CashoutUnavailable { .. }
        | WagerError::InvalidParent { .. } => StatusCode::CONFLICT,

        // Missing resources
        WagerError::BetNotFound { .. }
        | WagerError::OutcomeNotFound { .. }
        | WagerError::UnknownOutcome { .. }
        | WagerError::ParentNotFound { .. }
        | WagerError::UserNotFound { .. }
        | WagerError::TransactionNotFound { .. }
        | WagerError::ComboNotFound { .. }
        | WagerError::RoundNotFound { .. } => StatusCode::NOT_FOUND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn wager_errors_map_by_class() {
        let validation = WagerError::InvalidAmount { amount: dec!(-1) };
        assert_eq!(wager_status(&validation), StatusCode::BAD_REQUEST);

        let conflict = WagerError::InsufficientFunds {
            required: dec!(10),
            available: dec!(5),
        };
        assert_eq!(wager_status(&conflict), StatusCode::CONFLICT);

        let missing = WagerError::BetNotFound { bet_id: 7 };
        assert_eq!(wager_status(&missing), StatusCode::NOT_FOUND);
    }

    #[test]
    fn codes_survive_the_conversion() {
        let err: ApiError = WagerError::AlreadyProcessed { tx_id: 3 }.into();
        assert_eq!(err.code, "ALREADY_PROCESSED");
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err: ApiError = PuntError::Internal("pool exploded".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal server error");
    }
}
