//! Casino rounds: buy-in at start, credit at settlement.
//!
//! Every round costs its stake the moment it starts; an abandoned round is
//! simply a lost buy-in. All game progress lives in the round row's
//! `game_data`, drawn server-side under the row lock. The client names a
//! round id and an action, nothing more; echoed progress or multipliers
//! are never read.

use rand::Rng;
use rust_decimal::Decimal;
use sqlx::Row;
use tracing::{info, instrument};

use crate::domain::{
    CasinoGame, CasinoRound, GemsData, RouletteData, RoulettePick, RoundStatus,
};
use crate::engine::{ledger, payout, Engine};
use crate::error::{PuntError, Result, WagerError};

/// A started round with the post-debit balance
#[derive(Debug, Clone)]
pub struct RoundReceipt {
    pub round: CasinoRound,
    pub new_balance: Decimal,
}

/// What the server drew on a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    /// Gems: a safe cell; the round continues
    Gem { revealed: u32, multiplier: Decimal },
    /// Gems: the bomb; the round is lost
    Bomb { revealed: u32 },
    /// Roulette: the wheel settled the round either way
    Wheel { rolled: u8, win_amount: Decimal },
}

/// Result of one step call
#[derive(Debug, Clone)]
pub struct StepReceipt {
    pub round_id: i64,
    pub status: RoundStatus,
    pub event: StepEvent,
    /// Set when the step settled the round with a credit
    pub new_balance: Option<Decimal>,
}

/// Result of cashing out an active gems round
#[derive(Debug, Clone)]
pub struct CashoutReceipt {
    pub round_id: i64,
    pub multiplier: Decimal,
    pub win_amount: Decimal,
    pub new_balance: Decimal,
}

fn draw_gem() -> bool {
    rand::thread_rng().gen_bool(0.5)
}

fn spin_wheel() -> u8 {
    rand::thread_rng().gen_range(0..=36)
}

impl Engine {
    /// Start a round: validate the stake, debit it, create the round row.
    ///
    /// Roulette requires the pick up front; gems takes none. Returns the
    /// round with its initial server-side state and the post-debit
    /// balance.
    #[instrument(skip(self))]
    pub async fn start_round(
        &self,
        user_id: i64,
        game: CasinoGame,
        stake: Decimal,
        pick: Option<RoulettePick>,
    ) -> Result<RoundReceipt> {
        ledger::validate_amount(stake)?;
        let minimum = self.rules().min_casino_stake;
        if stake < minimum {
            return Err(WagerError::BelowMinimum {
                amount: stake,
                minimum,
            }
            .into());
        }

        let game_data = match game {
            CasinoGame::Gems => serde_json::to_value(GemsData {
                revealed: 0,
                trail: Vec::new(),
                multiplier: payout::gems_multiplier(0),
            })?,
            CasinoGame::Roulette => {
                let pick = pick.ok_or_else(|| {
                    WagerError::InvalidPick("roulette needs a pick at round start".into())
                })?;
                if !payout::is_valid_pick(pick) {
                    return Err(WagerError::InvalidPick(format!(
                        "no such pocket on the wheel: {:?}",
                        pick
                    ))
                    .into());
                }
                serde_json::to_value(RouletteData {
                    pick,
                    rolled: None,
                    multiplier: Decimal::ZERO,
                })?
            }
        };

        let mut tx = self.pool().begin().await?;

        let new_balance = ledger::debit(&mut *tx, user_id, stake).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO casino_rounds (user_id, game, stake, win_amount, status, game_data)
            VALUES ($1, $2, $3, 0, 'ACTIVE', $4)
            RETURNING id, started_at
            "#,
        )
        .bind(user_id)
        .bind(game.as_str())
        .bind(stake)
        .bind(sqlx::types::Json(&game_data))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        let round_id: i64 = row.get("id");
        info!(user_id, round_id, %game, %stake, "round started");

        Ok(RoundReceipt {
            round: CasinoRound {
                id: round_id,
                user_id,
                game,
                stake,
                win_amount: Decimal::ZERO,
                status: RoundStatus::Active,
                game_data,
                started_at: row.get("started_at"),
                settled_at: None,
            },
            new_balance,
        })
    }

    /// Advance a round by one server-side draw.
    ///
    /// Gems: a 50/50 gem-or-bomb; a gem raises the ladder multiplier, the
    /// bomb ends the round as LOST (the stake left at start, nothing more
    /// is taken). Roulette: one spin settles the round immediately.
    #[instrument(skip(self))]
    pub async fn step_round(&self, user_id: i64, round_id: i64) -> Result<StepReceipt> {
        let mut tx = self.pool().begin().await?;

        let round = lock_round(&mut tx, user_id, round_id).await?;
        let status: String = round.get("status");
        if status != RoundStatus::Active.as_str() {
            return Err(WagerError::RoundNotActive { round_id }.into());
        }

        let game_str: String = round.get("game");
        let game = CasinoGame::try_from(game_str.as_str()).map_err(PuntError::Internal)?;
        let stake: Decimal = round.get("stake");
        let game_data: sqlx::types::Json<serde_json::Value> = round.get("game_data");

        let receipt = match game {
            CasinoGame::Gems => {
                let mut data: GemsData = serde_json::from_value(game_data.0)?;
                if draw_gem() {
                    data.revealed += 1;
                    data.trail.push(true);
                    data.multiplier = payout::gems_multiplier(data.revealed);

                    sqlx::query("UPDATE casino_rounds SET game_data = $1 WHERE id = $2")
                        .bind(sqlx::types::Json(serde_json::to_value(&data)?))
                        .bind(round_id)
                        .execute(&mut *tx)
                        .await?;

                    StepReceipt {
                        round_id,
                        status: RoundStatus::Active,
                        event: StepEvent::Gem {
                            revealed: data.revealed,
                            multiplier: data.multiplier,
                        },
                        new_balance: None,
                    }
                } else {
                    data.trail.push(false);

                    sqlx::query(
                        r#"
                        UPDATE casino_rounds
                        SET game_data = $1, status = 'LOST', settled_at = NOW()
                        WHERE id = $2
                        "#,
                    )
                    .bind(sqlx::types::Json(serde_json::to_value(&data)?))
                    .bind(round_id)
                    .execute(&mut *tx)
                    .await?;

                    StepReceipt {
                        round_id,
                        status: RoundStatus::Lost,
                        event: StepEvent::Bomb {
                            revealed: data.revealed,
                        },
                        new_balance: None,
                    }
                }
            }
            CasinoGame::Roulette => {
                let mut data: RouletteData = serde_json::from_value(game_data.0)?;
                let rolled = spin_wheel();
                let win_amount = payout::roulette_payout(stake, data.pick, rolled);
                let won = win_amount > Decimal::ZERO;

                data.rolled = Some(rolled);
                data.multiplier = if won {
                    payout::roulette_multiplier(data.pick)
                } else {
                    Decimal::ZERO
                };

                let new_balance = if won {
                    Some(ledger::credit(&mut *tx, user_id, win_amount).await?)
                } else {
                    None
                };

                sqlx::query(
                    r#"
                    UPDATE casino_rounds
                    SET game_data = $1, status = $2, win_amount = $3, settled_at = NOW()
                    WHERE id = $4
                    "#,
                )
                .bind(sqlx::types::Json(serde_json::to_value(&data)?))
                .bind(if won {
                    RoundStatus::Won.as_str()
                } else {
                    RoundStatus::Lost.as_str()
                })
                .bind(win_amount)
                .bind(round_id)
                .execute(&mut *tx)
                .await?;

                StepReceipt {
                    round_id,
                    status: if won { RoundStatus::Won } else { RoundStatus::Lost },
                    event: StepEvent::Wheel { rolled, win_amount },
                    new_balance,
                }
            }
        };

        tx.commit().await?;
        info!(user_id, round_id, status = %receipt.status, "round stepped");
        Ok(receipt)
    }

    /// Cash an active gems round out at the current ladder multiplier.
    ///
    /// Cashing out before any reveal pays the stake back (ladder index
    /// zero is 1.00). Roulette rounds settle on the spin and cannot cash
    /// out.
    #[instrument(skip(self))]
    pub async fn cashout_round(&self, user_id: i64, round_id: i64) -> Result<CashoutReceipt> {
        let mut tx = self.pool().begin().await?;

        let round = lock_round(&mut tx, user_id, round_id).await?;
        let status: String = round.get("status");
        if status != RoundStatus::Active.as_str() {
            return Err(WagerError::RoundNotActive { round_id }.into());
        }

        let game_str: String = round.get("game");
        let game = CasinoGame::try_from(game_str.as_str()).map_err(PuntError::Internal)?;
        if game != CasinoGame::Gems {
            return Err(WagerError::CashoutUnavailable { round_id }.into());
        }

        let stake: Decimal = round.get("stake");
        let game_data: sqlx::types::Json<serde_json::Value> = round.get("game_data");
        let data: GemsData = serde_json::from_value(game_data.0)?;

        let multiplier = payout::gems_multiplier(data.revealed);
        let win_amount = payout::gems_payout(stake, data.revealed);

        let new_balance = ledger::credit(&mut *tx, user_id, win_amount).await?;

        sqlx::query(
            r#"
            UPDATE casino_rounds
            SET status = 'WON', win_amount = $1, settled_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(win_amount)
        .bind(round_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            user_id,
            round_id,
            revealed = data.revealed,
            %multiplier,
            %win_amount,
            "round cashed out"
        );

        Ok(CashoutReceipt {
            round_id,
            multiplier,
            win_amount,
            new_balance,
        })
    }
}

/// Lock the round row for this user. A round id belonging to someone else
/// reads the same as a missing one.
async fn lock_round(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: i64,
    round_id: i64,
) -> Result<sqlx::postgres::PgRow> {
    let row = sqlx::query(
        r#"
        SELECT game, stake, status, game_data
        FROM casino_rounds
        WHERE id = $1 AND user_id = $2
        FOR UPDATE
        "#,
    )
    .bind(round_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.ok_or_else(|| WagerError::RoundNotFound { round_id }.into())
}
