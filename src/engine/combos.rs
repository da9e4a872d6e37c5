//! Combination wagers: one stake across two or more bets.
//!
//! Placement snapshots every leg's odds and debits the stake; the legs
//! never feed the repricing engine or the outcome stake totals. A combo
//! resolves only once every leg's bet has closed, and pays at most once no
//! matter how many times it is evaluated.

use rust_decimal::Decimal;
use sqlx::{Postgres, Row, Transaction};
use tracing::{debug, info, instrument};

use crate::domain::{BetStatus, Combo, ComboSelection, ComboStatus};
use crate::engine::{ledger, odds, Engine};
use crate::error::{Result, WagerError};

/// One leg as submitted by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboSelectionInput {
    pub bet_id: i64,
    pub outcome_id: i64,
}

/// Accepted combo with its snapshotted legs and the post-debit balance
#[derive(Debug, Clone)]
pub struct ComboReceipt {
    pub combo: Combo,
    pub selections: Vec<ComboSelection>,
    pub new_balance: Decimal,
}

/// What one evaluation pass did to a combo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboResolution {
    /// At least one leg's bet is still open; nothing changed
    Pending,
    /// Every leg matched its bet's result; the win was credited
    Won,
    /// All legs settled and at least one missed
    Lost,
    /// The combo was already terminal; nothing changed
    AlreadySettled,
}

/// Batch evaluation summary
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    /// Pending combos visited
    pub scanned: u64,
    pub won: u64,
    pub lost: u64,
    /// Visited combos still waiting on open bets
    pub still_pending: u64,
}

impl SweepReport {
    /// Combos moved to a terminal state by this sweep
    pub fn settled(&self) -> u64 {
        self.won + self.lost
    }
}

impl Engine {
    /// Place a combination wager across two or more distinct bets.
    ///
    /// The selected bet rows are locked in ascending id order before the
    /// user row, the same direction every other operation takes. Holding
    /// the bet locks keeps the outcome odds steady while they are
    /// snapshotted, so the outcome rows themselves stay unlocked.
    #[instrument(skip(self, selections))]
    pub async fn place_combo(
        &self,
        user_id: i64,
        selections: &[ComboSelectionInput],
        stake: Decimal,
    ) -> Result<ComboReceipt> {
        ledger::validate_amount(stake)?;
        if selections.len() < odds::MIN_COMBO_SELECTIONS {
            return Err(WagerError::TooFewSelections {
                count: selections.len(),
                minimum: odds::MIN_COMBO_SELECTIONS,
            }
            .into());
        }

        let mut bet_ids: Vec<i64> = selections.iter().map(|s| s.bet_id).collect();
        bet_ids.sort_unstable();
        for pair in bet_ids.windows(2) {
            if pair[0] == pair[1] {
                return Err(WagerError::SelectionUnavailable { bet_id: pair[0] }.into());
            }
        }

        let mut tx = self.pool().begin().await?;

        let bet_rows = sqlx::query(
            "SELECT id, status FROM bets WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&bet_ids[..])
        .fetch_all(&mut *tx)
        .await?;
        for &bet_id in &bet_ids {
            let row = bet_rows
                .iter()
                .find(|row| row.get::<i64, _>("id") == bet_id)
                .ok_or(WagerError::SelectionUnavailable { bet_id })?;
            let status: String = row.get("status");
            if status != BetStatus::Open.as_str() {
                return Err(WagerError::SelectionUnavailable { bet_id }.into());
            }
        }

        let outcome_ids: Vec<i64> = selections.iter().map(|s| s.outcome_id).collect();
        let outcome_rows =
            sqlx::query("SELECT id, bet_id, odds FROM outcomes WHERE id = ANY($1)")
                .bind(&outcome_ids[..])
                .fetch_all(&mut *tx)
                .await?;

        let mut leg_odds = Vec::with_capacity(selections.len());
        for selection in selections {
            let row = outcome_rows
                .iter()
                .find(|row| {
                    row.get::<i64, _>("id") == selection.outcome_id
                        && row.get::<i64, _>("bet_id") == selection.bet_id
                })
                .ok_or(WagerError::SelectionUnavailable {
                    bet_id: selection.bet_id,
                })?;
            leg_odds.push(row.get::<Decimal, _>("odds"));
        }

        let total_odds = odds::combo_total_odds(&leg_odds);
        let potential_win = odds::potential_win(stake, total_odds);

        let new_balance = ledger::debit(&mut *tx, user_id, stake).await?;

        let combo_row = sqlx::query(
            r#"
            INSERT INTO combos (user_id, stake, total_odds, potential_win, status)
            VALUES ($1, $2, $3, $4, 'PENDING')
            RETURNING id, placed_at
            "#,
        )
        .bind(user_id)
        .bind(stake)
        .bind(total_odds)
        .bind(potential_win)
        .fetch_one(&mut *tx)
        .await?;
        let combo_id: i64 = combo_row.get("id");

        let mut legs = Vec::with_capacity(selections.len());
        for (selection, odds_snapshot) in selections.iter().zip(&leg_odds) {
            let leg_row = sqlx::query(
                r#"
                INSERT INTO combo_selections (combo_id, bet_id, outcome_id, odds_snapshot)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(combo_id)
            .bind(selection.bet_id)
            .bind(selection.outcome_id)
            .bind(odds_snapshot)
            .fetch_one(&mut *tx)
            .await?;
            legs.push(ComboSelection {
                id: leg_row.get("id"),
                combo_id,
                bet_id: selection.bet_id,
                outcome_id: selection.outcome_id,
                odds_snapshot: *odds_snapshot,
            });
        }

        tx.commit().await?;
        info!(
            user_id,
            combo_id,
            legs = legs.len(),
            %stake,
            %total_odds,
            %potential_win,
            "combo placed"
        );

        Ok(ComboReceipt {
            combo: Combo {
                id: combo_id,
                user_id,
                stake,
                total_odds,
                potential_win,
                status: ComboStatus::Pending,
                placed_at: combo_row.get("placed_at"),
                settled_at: None,
            },
            selections: legs,
            new_balance,
        })
    }

    /// Evaluate one combo in its own transaction.
    #[instrument(skip(self))]
    pub async fn evaluate_combo(&self, combo_id: i64) -> Result<ComboResolution> {
        let mut tx = self.pool().begin().await?;
        let resolution = evaluate_combo_tx(&mut tx, combo_id).await?;
        tx.commit().await?;
        Ok(resolution)
    }

    /// Evaluate every pending combo, one transaction each, oldest first.
    ///
    /// Bet closure already cascades into the combos it affects; the sweep
    /// exists as an operator backstop and settles anything the cascade
    /// would have.
    #[instrument(skip(self))]
    pub async fn sweep_combos(&self) -> Result<SweepReport> {
        let combo_ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM combos WHERE status = 'PENDING' ORDER BY id")
                .fetch_all(self.pool())
                .await?;

        let mut report = SweepReport::default();
        for combo_id in combo_ids {
            report.scanned += 1;
            match self.evaluate_combo(combo_id).await? {
                ComboResolution::Won => report.won += 1,
                ComboResolution::Lost => report.lost += 1,
                ComboResolution::Pending => report.still_pending += 1,
                ComboResolution::AlreadySettled => {}
            }
        }

        info!(
            scanned = report.scanned,
            won = report.won,
            lost = report.lost,
            still_pending = report.still_pending,
            "combo sweep finished"
        );
        Ok(report)
    }
}

/// Evaluation body shared by the settlement cascade and the standalone
/// paths. The combo row lock makes the PENDING check and the payout one
/// atomic step: a combo that is terminal by the time the lock arrives is
/// left alone, so repeated evaluation can never credit twice.
pub(crate) async fn evaluate_combo_tx(
    tx: &mut Transaction<'_, Postgres>,
    combo_id: i64,
) -> Result<ComboResolution> {
    let combo = sqlx::query(
        "SELECT user_id, potential_win, status FROM combos WHERE id = $1 FOR UPDATE",
    )
    .bind(combo_id)
    .fetch_optional(&mut **tx)
    .await?;
    let combo = match combo {
        Some(row) => row,
        None => return Err(WagerError::ComboNotFound { combo_id }.into()),
    };
    let status: String = combo.get("status");
    if status != ComboStatus::Pending.as_str() {
        return Ok(ComboResolution::AlreadySettled);
    }

    let legs = sqlx::query(
        r#"
        SELECT s.outcome_id, b.status AS bet_status, b.result_outcome_id
        FROM combo_selections s
        JOIN bets b ON b.id = s.bet_id
        WHERE s.combo_id = $1
        ORDER BY s.id
        "#,
    )
    .bind(combo_id)
    .fetch_all(&mut **tx)
    .await?;

    let mut all_hit = true;
    for leg in &legs {
        let bet_status: String = leg.get("bet_status");
        if bet_status == BetStatus::Open.as_str() {
            debug!(combo_id, "combo still has open legs");
            return Ok(ComboResolution::Pending);
        }
        let outcome_id: i64 = leg.get("outcome_id");
        let result_outcome_id: Option<i64> = leg.get("result_outcome_id");
        if result_outcome_id != Some(outcome_id) {
            all_hit = false;
        }
    }

    let resolution = if all_hit {
        let user_id: i64 = combo.get("user_id");
        let potential_win: Decimal = combo.get("potential_win");
        ledger::credit(&mut **tx, user_id, potential_win).await?;
        ComboResolution::Won
    } else {
        ComboResolution::Lost
    };

    sqlx::query("UPDATE combos SET status = $1, settled_at = NOW() WHERE id = $2")
        .bind(match resolution {
            ComboResolution::Won => ComboStatus::Won.as_str(),
            _ => ComboStatus::Lost.as_str(),
        })
        .bind(combo_id)
        .execute(&mut **tx)
        .await?;

    info!(combo_id, ?resolution, "combo settled");
    Ok(resolution)
}
