//! PostgreSQL storage adapter.
//!
//! Owns pool construction, migrations, and the read-side queries behind the
//! HTTP listings. Balance-mutating operations live in [`crate::engine`] and
//! run on transactions taken from the same pool.

use std::collections::HashMap;
use std::time::Duration;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::info;

use crate::domain::{
    Bet, BetStatus, CasinoGame, CasinoRound, Combo, ComboSelection, ComboStatus, Outcome,
    RoundStatus, Transaction, TransactionKind, TransactionStatus, User, Wager, WagerStatus,
};
use crate::error::{PuntError, Result};

/// Postgres-backed store shared by the engine and the HTTP layer.
///
/// Cloning is cheap; the inner [`PgPool`] is reference-counted.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to Postgres and build the shared pool.
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wrap an existing connection pool (tests, embedded setups).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Liveness probe used by the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ==================== Users ====================

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, balance, is_admin, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, balance, is_admin, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    // ==================== Bets ====================

    /// Open top-level bets with outcomes and detail bets, newest first.
    pub async fn list_open_bets(&self) -> Result<Vec<BetDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, status, result_outcome_id, minimum_bet, parent_bet_id,
                   created_by, created_at, closed_at
            FROM bets
            WHERE status = 'OPEN' AND parent_bet_id IS NULL
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let bets = rows.iter().map(bet_from_row).collect::<Result<Vec<_>>>()?;
        self.assemble_details(bets).await
    }

    /// One bet (any status) with outcomes and detail bets.
    pub async fn get_bet(&self, bet_id: i64) -> Result<Option<BetDetail>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, status, result_outcome_id, minimum_bet, parent_bet_id,
                   created_by, created_at, closed_at
            FROM bets WHERE id = $1
            "#,
        )
        .bind(bet_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let bet = bet_from_row(&row)?;
        let mut details = self.assemble_details(vec![bet]).await?;
        Ok(details.pop())
    }

    /// Attach outcomes and one level of children to each bet.
    async fn assemble_details(&self, bets: Vec<Bet>) -> Result<Vec<BetDetail>> {
        if bets.is_empty() {
            return Ok(Vec::new());
        }
        let parent_ids: Vec<i64> = bets.iter().map(|b| b.id).collect();

        let child_rows = sqlx::query(
            r#"
            SELECT id, title, status, result_outcome_id, minimum_bet, parent_bet_id,
                   created_by, created_at, closed_at
            FROM bets WHERE parent_bet_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&parent_ids)
        .fetch_all(&self.pool)
        .await?;
        let children = child_rows
            .iter()
            .map(bet_from_row)
            .collect::<Result<Vec<_>>>()?;

        let mut all_ids = parent_ids;
        all_ids.extend(children.iter().map(|b| b.id));

        let outcome_rows = sqlx::query(
            r#"
            SELECT id, bet_id, label, odds, total_stake, sort_order
            FROM outcomes WHERE bet_id = ANY($1)
            ORDER BY sort_order, id
            "#,
        )
        .bind(&all_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut outcomes_by_bet: HashMap<i64, Vec<Outcome>> = HashMap::new();
        for row in &outcome_rows {
            let outcome = outcome_from_row(row);
            outcomes_by_bet
                .entry(outcome.bet_id)
                .or_default()
                .push(outcome);
        }

        let mut children_by_parent: HashMap<i64, Vec<BetWithOutcomes>> = HashMap::new();
        for child in children {
            let Some(parent_id) = child.parent_bet_id else {
                continue;
            };
            let outcomes = outcomes_by_bet.remove(&child.id).unwrap_or_default();
            children_by_parent
                .entry(parent_id)
                .or_default()
                .push(BetWithOutcomes {
                    bet: child,
                    outcomes,
                });
        }

        Ok(bets
            .into_iter()
            .map(|bet| {
                let outcomes = outcomes_by_bet.remove(&bet.id).unwrap_or_default();
                let details = children_by_parent.remove(&bet.id).unwrap_or_default();
                BetDetail {
                    bet,
                    outcomes,
                    details,
                }
            })
            .collect())
    }

    // ==================== Wagers ====================

    /// A user's wager history, newest first.
    pub async fn list_user_wagers(&self, user_id: i64) -> Result<Vec<WagerView>> {
        let rows = sqlx::query(
            r#"
            SELECT w.id, w.user_id, w.bet_id, w.outcome_id, w.stake, w.odds_snapshot,
                   w.potential_win, w.status, w.placed_at, w.settled_at,
                   b.title AS bet_title, o.label AS outcome_label
            FROM wagers w
            JOIN bets b ON b.id = w.bet_id
            JOIN outcomes o ON o.id = w.outcome_id
            WHERE w.user_id = $1
            ORDER BY w.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(WagerView {
                    wager: wager_from_row(row)?,
                    bet_title: row.get("bet_title"),
                    outcome_label: row.get("outcome_label"),
                })
            })
            .collect()
    }

    // ==================== Combos ====================

    /// A user's combos with their selections, newest first.
    pub async fn list_user_combos(&self, user_id: i64) -> Result<Vec<ComboView>> {
        let combo_rows = sqlx::query(
            r#"
            SELECT id, user_id, stake, total_odds, potential_win, status, placed_at, settled_at
            FROM combos WHERE user_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let combos = combo_rows
            .iter()
            .map(combo_from_row)
            .collect::<Result<Vec<_>>>()?;
        if combos.is_empty() {
            return Ok(Vec::new());
        }

        let combo_ids: Vec<i64> = combos.iter().map(|c| c.id).collect();
        let selection_rows = sqlx::query(
            r#"
            SELECT s.id, s.combo_id, s.bet_id, s.outcome_id, s.odds_snapshot,
                   b.title AS bet_title, o.label AS outcome_label
            FROM combo_selections s
            JOIN bets b ON b.id = s.bet_id
            JOIN outcomes o ON o.id = s.outcome_id
            WHERE s.combo_id = ANY($1)
            ORDER BY s.id
            "#,
        )
        .bind(&combo_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut selections_by_combo: HashMap<i64, Vec<ComboSelectionView>> = HashMap::new();
        for row in &selection_rows {
            let view = ComboSelectionView {
                selection: selection_from_row(row),
                bet_title: row.get("bet_title"),
                outcome_label: row.get("outcome_label"),
            };
            selections_by_combo
                .entry(view.selection.combo_id)
                .or_default()
                .push(view);
        }

        Ok(combos
            .into_iter()
            .map(|combo| {
                let selections = selections_by_combo.remove(&combo.id).unwrap_or_default();
                ComboView { combo, selections }
            })
            .collect())
    }

    // ==================== Transactions ====================

    /// A user's own requests, newest first.
    pub async fn list_user_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, kind, amount, counterparty_id, status, requested_at,
                   processed_at, processed_by
            FROM transactions WHERE user_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    /// The admin review queue, oldest first.
    pub async fn list_transactions_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, kind, amount, counterparty_id, status, requested_at,
                   processed_at, processed_by
            FROM transactions WHERE status = $1
            ORDER BY id
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    // ==================== Casino ====================

    /// A user's casino rounds, newest first.
    pub async fn list_user_rounds(&self, user_id: i64) -> Result<Vec<CasinoRound>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, game, stake, win_amount, status, game_data,
                   started_at, settled_at
            FROM casino_rounds WHERE user_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(round_from_row).collect()
    }
}

// ==================== Row mapping ====================

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        balance: row.get("balance"),
        is_admin: row.get("is_admin"),
        created_at: row.get("created_at"),
    }
}

fn bet_from_row(row: &PgRow) -> Result<Bet> {
    let status_str: String = row.get("status");
    let status = BetStatus::try_from(status_str.as_str()).map_err(PuntError::Internal)?;
    Ok(Bet {
        id: row.get("id"),
        title: row.get("title"),
        status,
        result_outcome_id: row.get("result_outcome_id"),
        minimum_bet: row.get("minimum_bet"),
        parent_bet_id: row.get("parent_bet_id"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        closed_at: row.get("closed_at"),
    })
}

fn outcome_from_row(row: &PgRow) -> Outcome {
    Outcome {
        id: row.get("id"),
        bet_id: row.get("bet_id"),
        label: row.get("label"),
        odds: row.get("odds"),
        total_stake: row.get("total_stake"),
        sort_order: row.get("sort_order"),
    }
}

fn wager_from_row(row: &PgRow) -> Result<Wager> {
    let status_str: String = row.get("status");
    let status = WagerStatus::try_from(status_str.as_str()).map_err(PuntError::Internal)?;
    Ok(Wager {
        id: row.get("id"),
        user_id: row.get("user_id"),
        bet_id: row.get("bet_id"),
        outcome_id: row.get("outcome_id"),
        stake: row.get("stake"),
        odds_snapshot: row.get("odds_snapshot"),
        potential_win: row.get("potential_win"),
        status,
        placed_at: row.get("placed_at"),
        settled_at: row.get("settled_at"),
    })
}

fn combo_from_row(row: &PgRow) -> Result<Combo> {
    let status_str: String = row.get("status");
    let status = ComboStatus::try_from(status_str.as_str()).map_err(PuntError::Internal)?;
    Ok(Combo {
        id: row.get("id"),
        user_id: row.get("user_id"),
        stake: row.get("stake"),
        total_odds: row.get("total_odds"),
        potential_win: row.get("potential_win"),
        status,
        placed_at: row.get("placed_at"),
        settled_at: row.get("settled_at"),
    })
}

fn selection_from_row(row: &PgRow) -> ComboSelection {
    ComboSelection {
        id: row.get("id"),
        combo_id: row.get("combo_id"),
        bet_id: row.get("bet_id"),
        outcome_id: row.get("outcome_id"),
        odds_snapshot: row.get("odds_snapshot"),
    }
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction> {
    let kind_str: String = row.get("kind");
    let kind = TransactionKind::try_from(kind_str.as_str()).map_err(PuntError::Internal)?;
    let status_str: String = row.get("status");
    let status = TransactionStatus::try_from(status_str.as_str()).map_err(PuntError::Internal)?;
    Ok(Transaction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind,
        amount: row.get("amount"),
        counterparty_id: row.get("counterparty_id"),
        status,
        requested_at: row.get("requested_at"),
        processed_at: row.get("processed_at"),
        processed_by: row.get("processed_by"),
    })
}

fn round_from_row(row: &PgRow) -> Result<CasinoRound> {
    let game_str: String = row.get("game");
    let game = CasinoGame::try_from(game_str.as_str()).map_err(PuntError::Internal)?;
    let status_str: String = row.get("status");
    let status = RoundStatus::try_from(status_str.as_str()).map_err(PuntError::Internal)?;
    let game_data: sqlx::types::Json<serde_json::Value> = row.get("game_data");
    Ok(CasinoRound {
        id: row.get("id"),
        user_id: row.get("user_id"),
        game,
        stake: row.get("stake"),
        win_amount: row.get("win_amount"),
        status,
        game_data: game_data.0,
        started_at: row.get("started_at"),
        settled_at: row.get("settled_at"),
    })
}

// ==================== View structs ====================

/// A bet with its outcomes, as shown on the board.
#[derive(Debug, Clone)]
pub struct BetWithOutcomes {
    pub bet: Bet,
    pub outcomes: Vec<Outcome>,
}

/// Full bet view: outcomes plus one level of detail bets.
#[derive(Debug, Clone)]
pub struct BetDetail {
    pub bet: Bet,
    pub outcomes: Vec<Outcome>,
    pub details: Vec<BetWithOutcomes>,
}

/// A wager joined with display fields from its bet and outcome.
#[derive(Debug, Clone)]
pub struct WagerView {
    pub wager: Wager,
    pub bet_title: String,
    pub outcome_label: String,
}

/// A combo with its selections and display fields.
#[derive(Debug, Clone)]
pub struct ComboView {
    pub combo: Combo,
    pub selections: Vec<ComboSelectionView>,
}

/// One combo leg joined with display fields.
#[derive(Debug, Clone)]
pub struct ComboSelectionView {
    pub selection: ComboSelection,
    pub bet_title: String,
    pub outcome_label: String,
}
