use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the wagering service
#[derive(Error, Debug)]
pub enum PuntError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Domain errors (validation, state conflicts, missing resources)
    #[error(transparent)]
    Wager(#[from] WagerError),

    // Validation errors outside the wagering domain
    #[error("Validation failed: {0}")]
    Validation(String),

    // Authentication / authorization errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl PuntError {
    /// True for transient database failures the caller may retry:
    /// serialization aborts (40001) and deadlocks (40P01). The transaction
    /// was rolled back, no effects persist.
    pub fn is_retryable(&self) -> bool {
        match self {
            PuntError::Database(sqlx::Error::Database(db)) => {
                matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
            }
            PuntError::Database(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }
}

/// Result type alias for PuntError
pub type Result<T> = std::result::Result<T, PuntError>;

/// Domain failures with stable machine-readable codes.
///
/// Validation variants are raised before any row lock is taken;
/// state-conflict variants are raised under lock and always roll the
/// enclosing transaction back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WagerError {
    // Validation (pre-lock)
    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Amount {amount} below minimum {minimum}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    #[error("Bet title must not be empty")]
    InvalidTitle,

    #[error("Invalid outcomes: {0}")]
    InvalidOutcomes(String),

    #[error("Combo needs at least {minimum} selections, got {count}")]
    TooFewSelections { count: usize, minimum: usize },

    #[error("Invalid pick: {0}")]
    InvalidPick(String),

    // State conflicts (under lock)
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Bet {bet_id} is not open")]
    BetNotOpen { bet_id: i64 },

    #[error("Bet {bet_id} is already closed")]
    AlreadyClosed { bet_id: i64 },

    #[error("Selection on bet {bet_id} unavailable")]
    SelectionUnavailable { bet_id: i64 },

    #[error("Transaction {tx_id} already processed")]
    AlreadyProcessed { tx_id: i64 },

    #[error("Round {round_id} is not active")]
    RoundNotActive { round_id: i64 },

    #[error("Round {round_id} cannot cash out")]
    CashoutUnavailable { round_id: i64 },

    // Missing resources
    #[error("Bet {bet_id} not found")]
    BetNotFound { bet_id: i64 },

    #[error("Outcome {outcome_id} not found")]
    OutcomeNotFound { outcome_id: i64 },

    #[error("Outcome {outcome_id} does not belong to bet {bet_id}")]
    UnknownOutcome { outcome_id: i64, bet_id: i64 },

    #[error("Parent bet {bet_id} not found")]
    ParentNotFound { bet_id: i64 },

    #[error("Bet {bet_id} is itself a detail bet and cannot have children")]
    InvalidParent { bet_id: i64 },

    #[error("User {user_id} not found")]
    UserNotFound { user_id: i64 },

    #[error("Transaction {tx_id} not found")]
    TransactionNotFound { tx_id: i64 },

    #[error("Combo {combo_id} not found")]
    ComboNotFound { combo_id: i64 },

    #[error("Round {round_id} not found")]
    RoundNotFound { round_id: i64 },
}

impl WagerError {
    /// Stable code surfaced on the wire, independent of display text.
    pub fn code(&self) -> &'static str {
        match self {
            WagerError::InvalidAmount { .. } => "INVALID_AMOUNT",
            WagerError::BelowMinimum { .. } => "BELOW_MINIMUM",
            WagerError::InvalidTitle => "INVALID_TITLE",
            WagerError::InvalidOutcomes(_) => "INVALID_OUTCOMES",
            WagerError::TooFewSelections { .. } => "TOO_FEW_SELECTIONS",
            WagerError::InvalidPick(_) => "INVALID_PICK",
            WagerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            WagerError::BetNotOpen { .. } => "BET_NOT_OPEN",
            WagerError::AlreadyClosed { .. } => "ALREADY_CLOSED",
            WagerError::SelectionUnavailable { .. } => "SELECTION_UNAVAILABLE",
            WagerError::AlreadyProcessed { .. } => "ALREADY_PROCESSED",
            WagerError::RoundNotActive { .. } => "ROUND_NOT_ACTIVE",
            WagerError::CashoutUnavailable { .. } => "CASHOUT_UNAVAILABLE",
            WagerError::BetNotFound { .. } => "BET_NOT_FOUND",
            WagerError::OutcomeNotFound { .. } => "OUTCOME_NOT_FOUND",
            WagerError::UnknownOutcome { .. } => "UNKNOWN_OUTCOME",
            WagerError::ParentNotFound { .. } => "PARENT_NOT_FOUND",
            WagerError::InvalidParent { .. } => "INVALID_PARENT",
            WagerError::UserNotFound { .. } => "USER_NOT_FOUND",
            WagerError::TransactionNotFound { .. } => "TRANSACTION_NOT_FOUND",
            WagerError::ComboNotFound { .. } => "COMBO_NOT_FOUND",
            WagerError::RoundNotFound { .. } => "ROUND_NOT_FOUND",
        }
    }
}
