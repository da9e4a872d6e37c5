pub mod bets;
pub mod casino;
pub mod combos;
pub mod ledger;
pub mod odds;
pub mod payout;
pub mod settlement;
pub mod wallet;

use rust_decimal::Decimal;
use sqlx::postgres::PgPool;

use crate::config::WageringConfig;

pub use bets::{NewBet, NewDetailBet, NewOutcome, WagerReceipt};
pub use casino::{CashoutReceipt, RoundReceipt, StepEvent, StepReceipt};
pub use combos::{ComboReceipt, ComboResolution, ComboSelectionInput, SweepReport};
pub use settlement::SettlementReport;
pub use wallet::ApprovalReceipt;

/// Transactional wagering engine.
///
/// Every public operation opens one database transaction, takes row locks
/// in the global order (bet rows ascending, then outcome rows, then the
/// user row) and either commits the whole effect or leaves nothing behind.
#[derive(Clone)]
pub struct Engine {
    pool: PgPool,
    rules: Rules,
}

/// Operating limits lifted from configuration at startup
#[derive(Debug, Clone)]
pub struct Rules {
    pub starting_balance: Decimal,
    pub min_deposit: Decimal,
    pub min_withdrawal: Decimal,
    pub min_casino_stake: Decimal,
}

impl From<&WageringConfig> for Rules {
    fn from(config: &WageringConfig) -> Self {
        Self {
            starting_balance: config.starting_balance,
            min_deposit: config.min_deposit,
            min_withdrawal: config.min_withdrawal,
            min_casino_stake: config.min_casino_stake,
        }
    }
}

impl Engine {
    pub fn new(pool: PgPool, rules: Rules) -> Self {
        Self { pool, rules }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }
}
