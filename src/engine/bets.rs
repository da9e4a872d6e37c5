//! Bet authoring and single-wager placement.

use rust_decimal::Decimal;
use sqlx::Row;
use tracing::{info, instrument};

use crate::domain::{BetStatus, Outcome, Wager, WagerStatus};
use crate::engine::{ledger, odds, Engine};
use crate::error::{Result, WagerError};

/// Bets carry two or three outcomes, nothing else.
pub const MIN_OUTCOMES: usize = 2;
pub const MAX_OUTCOMES: usize = 3;

/// Outcome supplied at authoring time
#[derive(Debug, Clone)]
pub struct NewOutcome {
    pub label: String,
    pub odds: Decimal,
}

/// Detail bet nested under a new main bet
#[derive(Debug, Clone)]
pub struct NewDetailBet {
    pub title: String,
    pub outcomes: Vec<NewOutcome>,
    pub minimum_bet: Option<Decimal>,
}

/// Admin bet submission. `parent_bet_id` attaches the new bet as a detail
/// of an existing one; `details` nests fresh detail bets under it. The
/// hierarchy is one level deep, so the two are mutually exclusive.
#[derive(Debug, Clone)]
pub struct NewBet {
    pub title: String,
    pub outcomes: Vec<NewOutcome>,
    pub minimum_bet: Option<Decimal>,
    pub parent_bet_id: Option<i64>,
    pub details: Vec<NewDetailBet>,
}

/// Everything a caller needs to render an accepted wager: the snapshot
/// row, the balance after the debit, and the repriced outcome board.
#[derive(Debug, Clone)]
pub struct WagerReceipt {
    pub wager: Wager,
    pub new_balance: Decimal,
    pub outcomes: Vec<Outcome>,
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(WagerError::InvalidTitle.into());
    }
    Ok(())
}

fn validate_outcomes(outcomes: &[NewOutcome]) -> Result<()> {
    if outcomes.len() < MIN_OUTCOMES || outcomes.len() > MAX_OUTCOMES {
        return Err(WagerError::InvalidOutcomes(format!(
            "expected {} to {} outcomes, got {}",
            MIN_OUTCOMES,
            MAX_OUTCOMES,
            outcomes.len()
        ))
        .into());
    }
    for outcome in outcomes {
        if outcome.label.trim().is_empty() {
            return Err(WagerError::InvalidOutcomes("outcome label must not be empty".into()).into());
        }
        if !odds::is_valid_author_odds(outcome.odds) {
            return Err(WagerError::InvalidOutcomes(format!(
                "odds {} must lie in [{}, {}]",
                outcome.odds,
                odds::MIN_ODDS,
                odds::MAX_ODDS
            ))
            .into());
        }
    }
    Ok(())
}

fn validate_minimum_bet(minimum: Option<Decimal>) -> Result<()> {
    if let Some(minimum) = minimum {
        if minimum < Decimal::ZERO || !odds::has_cent_precision(minimum) {
            return Err(WagerError::InvalidAmount { amount: minimum }.into());
        }
    }
    Ok(())
}

impl Engine {
    /// Create a bet with its outcomes and any nested detail bets.
    /// Returns the new main bet's id.
    #[instrument(skip(self, new))]
    pub async fn create_bet(&self, creator_id: i64, new: &NewBet) -> Result<i64> {
        validate_title(&new.title)?;
        validate_outcomes(&new.outcomes)?;
        validate_minimum_bet(new.minimum_bet)?;
        for detail in &new.details {
            validate_title(&detail.title)?;
            validate_outcomes(&detail.outcomes)?;
            validate_minimum_bet(detail.minimum_bet)?;
        }
        if let Some(parent_id) = new.parent_bet_id {
            // One level deep: a detail bet cannot carry details of its own
            if !new.details.is_empty() {
                return Err(WagerError::InvalidParent { bet_id: parent_id }.into());
            }
        }

        let mut tx = self.pool().begin().await?;

        if let Some(parent_id) = new.parent_bet_id {
            let parent = sqlx::query("SELECT id, parent_bet_id FROM bets WHERE id = $1")
                .bind(parent_id)
                .fetch_optional(&mut *tx)
                .await?;
            match parent {
                None => return Err(WagerError::ParentNotFound { bet_id: parent_id }.into()),
                Some(row) => {
                    let grandparent: Option<i64> = row.get("parent_bet_id");
                    if grandparent.is_some() {
                        return Err(WagerError::InvalidParent { bet_id: parent_id }.into());
                    }
                }
            }
        }

        let bet_id = insert_bet(
            &mut tx,
            &new.title,
            new.minimum_bet.unwrap_or(Decimal::ZERO),
            new.parent_bet_id,
            creator_id,
        )
        .await?;
        insert_outcomes(&mut tx, bet_id, &new.outcomes).await?;

        for detail in &new.details {
            let detail_id = insert_bet(
                &mut tx,
                &detail.title,
                detail.minimum_bet.unwrap_or(Decimal::ZERO),
                Some(bet_id),
                creator_id,
            )
            .await?;
            insert_outcomes(&mut tx, detail_id, &detail.outcomes).await?;
        }

        tx.commit().await?;
        info!(bet_id, creator_id, details = new.details.len(), "bet created");
        Ok(bet_id)
    }

    /// Place a single wager.
    ///
    /// Lock order inside the transaction: the bet row, then its outcome
    /// rows ascending, then the user's balance row. The odds snapshot is
    /// taken before repricing, so the placed wager pays the price that was
    /// on the board.
    #[instrument(skip(self))]
    pub async fn place_bet(
        &self,
        user_id: i64,
        bet_id: i64,
        outcome_id: i64,
        stake: Decimal,
    ) -> Result<WagerReceipt> {
        ledger::validate_amount(stake)?;

        let mut tx = self.pool().begin().await?;

        let bet = sqlx::query("SELECT status, minimum_bet FROM bets WHERE id = $1 FOR UPDATE")
            .bind(bet_id)
            .fetch_optional(&mut *tx)
            .await?;
        let bet = match bet {
            Some(row) => row,
            None => return Err(WagerError::BetNotFound { bet_id }.into()),
        };
        let status: String = bet.get("status");
        if status != BetStatus::Open.as_str() {
            return Err(WagerError::BetNotOpen { bet_id }.into());
        }
        let minimum_bet: Decimal = bet.get("minimum_bet");
        if stake < minimum_bet {
            return Err(WagerError::BelowMinimum {
                amount: stake,
                minimum: minimum_bet,
            }
            .into());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, bet_id, label, odds, total_stake, sort_order
            FROM outcomes WHERE bet_id = $1
            ORDER BY id FOR UPDATE
            "#,
        )
        .bind(bet_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut outcomes: Vec<Outcome> = rows
            .iter()
            .map(|row| Outcome {
                id: row.get("id"),
                bet_id: row.get("bet_id"),
                label: row.get("label"),
                odds: row.get("odds"),
                total_stake: row.get("total_stake"),
                sort_order: row.get("sort_order"),
            })
            .collect();

        let odds_snapshot = match outcomes.iter().find(|o| o.id == outcome_id) {
            Some(outcome) => outcome.odds,
            None => return Err(WagerError::OutcomeNotFound { outcome_id }.into()),
        };

        let new_balance = ledger::debit(&mut *tx, user_id, stake).await?;
        let potential_win = odds::potential_win(stake, odds_snapshot);

        let wager_row = sqlx::query(
            r#"
            INSERT INTO wagers (user_id, bet_id, outcome_id, stake, odds_snapshot, potential_win, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'PENDING')
            RETURNING id, placed_at
            "#,
        )
        .bind(user_id)
        .bind(bet_id)
        .bind(outcome_id)
        .bind(stake)
        .bind(odds_snapshot)
        .bind(potential_win)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE outcomes SET total_stake = total_stake + $1 WHERE id = $2")
            .bind(stake)
            .bind(outcome_id)
            .execute(&mut *tx)
            .await?;

        let pairs: Vec<(i64, Decimal)> = outcomes.iter().map(|o| (o.id, o.odds)).collect();
        for (id, new_odds) in odds::reprice_bet(&pairs, outcome_id) {
            sqlx::query("UPDATE outcomes SET odds = $1 WHERE id = $2")
                .bind(new_odds)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            if let Some(outcome) = outcomes.iter_mut().find(|o| o.id == id) {
                outcome.odds = new_odds;
            }
        }
        if let Some(outcome) = outcomes.iter_mut().find(|o| o.id == outcome_id) {
            outcome.total_stake += stake;
        }

        tx.commit().await?;
        info!(user_id, bet_id, outcome_id, %stake, %potential_win, "wager placed");

        let wager = Wager {
            id: wager_row.get("id"),
            user_id,
            bet_id,
            outcome_id,
            stake,
            odds_snapshot,
            potential_win,
            status: WagerStatus::Pending,
            placed_at: wager_row.get("placed_at"),
            settled_at: None,
        };

        Ok(WagerReceipt {
            wager,
            new_balance,
            outcomes,
        })
    }
}

async fn insert_bet(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    title: &str,
    minimum_bet: Decimal,
    parent_bet_id: Option<i64>,
    creator_id: i64,
) -> Result<i64> {
    let row = sqlx::query(
        r#"
        INSERT INTO bets (title, status, minimum_bet, parent_bet_id, created_by)
        VALUES ($1, 'OPEN', $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(title.trim())
    .bind(minimum_bet)
    .bind(parent_bet_id)
    .bind(creator_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.get("id"))
}

async fn insert_outcomes(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    bet_id: i64,
    outcomes: &[NewOutcome],
) -> Result<()> {
    for (idx, outcome) in outcomes.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO outcomes (bet_id, label, odds, total_stake, sort_order)
            VALUES ($1, $2, $3, 0, $4)
            "#,
        )
        .bind(bet_id)
        .bind(outcome.label.trim())
        .bind(outcome.odds)
        .bind(idx as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn outcome(label: &str, odds: Decimal) -> NewOutcome {
        NewOutcome {
            label: label.to_string(),
            odds,
        }
    }

    #[test]
    fn test_outcome_count_bounds() {
        assert!(validate_outcomes(&[outcome("a", dec!(2.00))]).is_err());
        assert!(validate_outcomes(&[
            outcome("a", dec!(2.00)),
            outcome("b", dec!(1.80)),
        ])
        .is_ok());
        assert!(validate_outcomes(&[
            outcome("a", dec!(2.00)),
            outcome("b", dec!(1.80)),
            outcome("c", dec!(3.40)),
            outcome("d", dec!(4.00)),
        ])
        .is_err());
    }

    #[test]
    fn test_outcome_odds_and_labels() {
        assert!(validate_outcomes(&[
            outcome("a", dec!(1.00)),
            outcome("b", dec!(1.80)),
        ])
        .is_err());
        assert!(validate_outcomes(&[
            outcome("", dec!(2.00)),
            outcome("b", dec!(1.80)),
        ])
        .is_err());
        assert!(validate_outcomes(&[
            outcome("a", dec!(25.00)),
            outcome("b", dec!(1.05)),
        ])
        .is_ok());
    }

    #[test]
    fn test_minimum_bet_validity() {
        assert!(validate_minimum_bet(None).is_ok());
        assert!(validate_minimum_bet(Some(dec!(0))).is_ok());
        assert!(validate_minimum_bet(Some(dec!(50.00))).is_ok());
        assert!(validate_minimum_bet(Some(dec!(-1))).is_err());
        assert!(validate_minimum_bet(Some(dec!(0.005))).is_err());
    }

    #[test]
    fn test_title_required() {
        assert!(validate_title("Match winner").is_ok());
        assert!(validate_title("  ").is_err());
    }
}
