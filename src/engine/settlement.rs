//! Bet settlement: the one irreversible operation in the system.
//!
//! Closing a bet declares its result, pays every winning wager, marks the
//! rest lost, and re-evaluates every pending combo that holds a leg on the
//! bet. All of it happens in one transaction; a failure anywhere leaves the
//! bet open and every balance untouched.

use rust_decimal::Decimal;
use sqlx::{Postgres, Row, Transaction};
use tracing::{info, instrument};

use crate::domain::{BetStatus, WagerStatus};
use crate::engine::combos::{self, ComboResolution};
use crate::engine::{ledger, Engine};
use crate::error::{Result, WagerError};

/// What a closure did, for the admin response and the log line
#[derive(Debug, Clone, Default)]
pub struct SettlementReport {
    pub bet_id: i64,
    pub winning_outcome_id: i64,
    pub wagers_won: u64,
    pub wagers_lost: u64,
    /// Sum of potential wins credited to single-wager winners
    pub total_paid: Decimal,
    pub combos_won: u64,
    pub combos_lost: u64,
    /// Combos touched by the cascade that still wait on other bets
    pub combos_pending: u64,
}

impl Engine {
    /// Close a bet with its winning outcome.
    ///
    /// The bet lock is the serialization point: no wager can land on the
    /// bet once this transaction holds the row, and a second closure sees
    /// CLOSED and fails. Wagers settle in (user id, wager id) order so
    /// concurrent closures of different bets take user locks in the same
    /// direction.
    #[instrument(skip(self))]
    pub async fn close_bet(&self, bet_id: i64, winning_outcome_id: i64) -> Result<SettlementReport> {
        let mut tx = self.pool().begin().await?;

        let bet = sqlx::query("SELECT status FROM bets WHERE id = $1 FOR UPDATE")
            .bind(bet_id)
            .fetch_optional(&mut *tx)
            .await?;
        let bet = match bet {
            Some(row) => row,
            None => return Err(WagerError::BetNotFound { bet_id }.into()),
        };
        let status: String = bet.get("status");
        if status != BetStatus::Open.as_str() {
            return Err(WagerError::AlreadyClosed { bet_id }.into());
        }

        let belongs: Option<i64> =
            sqlx::query_scalar("SELECT id FROM outcomes WHERE id = $1 AND bet_id = $2")
                .bind(winning_outcome_id)
                .bind(bet_id)
                .fetch_optional(&mut *tx)
                .await?;
        if belongs.is_none() {
            return Err(WagerError::UnknownOutcome {
                outcome_id: winning_outcome_id,
                bet_id,
            }
            .into());
        }

        sqlx::query(
            r#"
            UPDATE bets SET status = 'CLOSED', result_outcome_id = $1, closed_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(winning_outcome_id)
        .bind(bet_id)
        .execute(&mut *tx)
        .await?;

        let mut report = SettlementReport {
            bet_id,
            winning_outcome_id,
            ..Default::default()
        };

        settle_wagers(&mut tx, bet_id, winning_outcome_id, &mut report).await?;
        cascade_combos(&mut tx, bet_id, &mut report).await?;

        tx.commit().await?;
        info!(
            bet_id,
            winning_outcome_id,
            wagers_won = report.wagers_won,
            wagers_lost = report.wagers_lost,
            total_paid = %report.total_paid,
            combos_won = report.combos_won,
            combos_lost = report.combos_lost,
            "bet closed"
        );
        Ok(report)
    }
}

/// Pay winners and mark losers among the bet's pending wagers.
async fn settle_wagers(
    tx: &mut Transaction<'_, Postgres>,
    bet_id: i64,
    winning_outcome_id: i64,
    report: &mut SettlementReport,
) -> Result<()> {
    let wagers = sqlx::query(
        r#"
        SELECT id, user_id, outcome_id, potential_win
        FROM wagers
        WHERE bet_id = $1 AND status = 'PENDING'
        ORDER BY user_id, id
        FOR UPDATE
        "#,
    )
    .bind(bet_id)
    .fetch_all(&mut **tx)
    .await?;

    for wager in &wagers {
        let wager_id: i64 = wager.get("id");
        let user_id: i64 = wager.get("user_id");
        let outcome_id: i64 = wager.get("outcome_id");
        let potential_win: Decimal = wager.get("potential_win");

        let won = outcome_id == winning_outcome_id;
        if won {
            ledger::credit(&mut **tx, user_id, potential_win).await?;
            report.wagers_won += 1;
            report.total_paid += potential_win;
        } else {
            report.wagers_lost += 1;
        }

        sqlx::query("UPDATE wagers SET status = $1, settled_at = NOW() WHERE id = $2")
            .bind(if won {
                WagerStatus::Won.as_str()
            } else {
                WagerStatus::Lost.as_str()
            })
            .bind(wager_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

/// Re-evaluate every pending combo holding a leg on the bet that just
/// closed, looked up through the selection index rather than a scan of all
/// pending combos.
async fn cascade_combos(
    tx: &mut Transaction<'_, Postgres>,
    bet_id: i64,
    report: &mut SettlementReport,
) -> Result<()> {
    let combo_ids: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT c.id
        FROM combos c
        JOIN combo_selections s ON s.combo_id = c.id
        WHERE s.bet_id = $1 AND c.status = 'PENDING'
        ORDER BY c.id
        "#,
    )
    .bind(bet_id)
    .fetch_all(&mut **tx)
    .await?;

    for combo_id in combo_ids {
        match combos::evaluate_combo_tx(tx, combo_id).await? {
            ComboResolution::Won => report.combos_won += 1,
            ComboResolution::Lost => report.combos_lost += 1,
            ComboResolution::Pending => report.combos_pending += 1,
            ComboResolution::AlreadySettled => {}
        }
    }

    Ok(())
}
