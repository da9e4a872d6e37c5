use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapters::{BetDetail, BetWithOutcomes, ComboView, WagerView};
use crate::domain::{Bet, CasinoRound, Outcome, RoulettePick, Transaction, User, Wager};
use crate::engine::{
    CashoutReceipt, ComboReceipt, RoundReceipt, SettlementReport, StepEvent, StepReceipt,
    SweepReport, WagerReceipt,
};
use crate::services::quotes::Quote;

// ============================================================================
// Auth Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: Uuid,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub balance: Decimal,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            balance: user.balance,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Bet Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeInput {
    pub label: String,
    pub odds: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailBetInput {
    pub title: String,
    pub outcomes: Vec<OutcomeInput>,
    #[serde(default)]
    pub minimum_bet: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBetRequest {
    pub title: String,
    pub outcomes: Vec<OutcomeInput>,
    #[serde(default)]
    pub minimum_bet: Option<Decimal>,
    #[serde(default)]
    pub parent_bet_id: Option<i64>,
    #[serde(default)]
    pub details: Vec<DetailBetInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBetResponse {
    pub bet_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseBetRequest {
    pub result_outcome_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeResponse {
    pub id: i64,
    pub label: String,
    pub odds: Decimal,
    pub total_stake: Decimal,
    pub sort_order: i32,
}

impl From<Outcome> for OutcomeResponse {
    fn from(outcome: Outcome) -> Self {
        Self {
            id: outcome.id,
            label: outcome.label,
            odds: outcome.odds,
            total_stake: outcome.total_stake,
            sort_order: outcome.sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetResponse {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub minimum_bet: Decimal,
    pub result_outcome_id: Option<i64>,
    pub parent_bet_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<OutcomeResponse>,
    /// One level of detail bets; always empty on the details themselves.
    pub details: Vec<BetResponse>,
}

fn bet_response(bet: Bet, outcomes: Vec<Outcome>, details: Vec<BetResponse>) -> BetResponse {
    BetResponse {
        id: bet.id,
        title: bet.title,
        status: bet.status.as_str().to_string(),
        minimum_bet: bet.minimum_bet,
        result_outcome_id: bet.result_outcome_id,
        parent_bet_id: bet.parent_bet_id,
        created_at: bet.created_at,
        closed_at: bet.closed_at,
        outcomes: outcomes.into_iter().map(Into::into).collect(),
        details,
    }
}

impl From<BetWithOutcomes> for BetResponse {
    fn from(view: BetWithOutcomes) -> Self {
        bet_response(view.bet, view.outcomes, Vec::new())
    }
}

impl From<BetDetail> for BetResponse {
    fn from(view: BetDetail) -> Self {
        let details = view.details.into_iter().map(Into::into).collect();
        bet_response(view.bet, view.outcomes, details)
    }
}

// ============================================================================
// Wager Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceWagerRequest {
    pub bet_id: i64,
    pub outcome_id: i64,
    pub stake: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WagerResponse {
    pub id: i64,
    pub bet_id: i64,
    pub outcome_id: i64,
    pub stake: Decimal,
    pub odds_snapshot: Decimal,
    pub potential_win: Decimal,
    pub status: String,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl From<Wager> for WagerResponse {
    fn from(wager: Wager) -> Self {
        Self {
            id: wager.id,
            bet_id: wager.bet_id,
            outcome_id: wager.outcome_id,
            stake: wager.stake,
            odds_snapshot: wager.odds_snapshot,
            potential_win: wager.potential_win,
            status: wager.status.as_str().to_string(),
            placed_at: wager.placed_at,
            settled_at: wager.settled_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceWagerResponse {
    pub wager: WagerResponse,
    pub new_balance: Decimal,
    /// The whole bet's odds after repricing.
    pub outcomes: Vec<OutcomeResponse>,
}

impl From<WagerReceipt> for PlaceWagerResponse {
    fn from(receipt: WagerReceipt) -> Self {
        Self {
            wager: receipt.wager.into(),
            new_balance: receipt.new_balance,
            outcomes: receipt.outcomes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WagerHistoryResponse {
    pub id: i64,
    pub bet_id: i64,
    pub bet_title: String,
    pub outcome_id: i64,
    pub outcome_label: String,
    pub stake: Decimal,
    pub odds_snapshot: Decimal,
    pub potential_win: Decimal,
    pub status: String,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl From<WagerView> for WagerHistoryResponse {
    fn from(view: WagerView) -> Self {
        Self {
            id: view.wager.id,
            bet_id: view.wager.bet_id,
            bet_title: view.bet_title,
            outcome_id: view.wager.outcome_id,
            outcome_label: view.outcome_label,
            stake: view.wager.stake,
            odds_snapshot: view.wager.odds_snapshot,
            potential_win: view.wager.potential_win,
            status: view.wager.status.as_str().to_string(),
            placed_at: view.wager.placed_at,
            settled_at: view.wager.settled_at,
        }
    }
}

// ============================================================================
// Combo Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionInput {
    pub bet_id: i64,
    pub outcome_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceComboRequest {
    pub stake: Decimal,
    pub selections: Vec<SelectionInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboSelectionResponse {
    pub bet_id: i64,
    /// Present in history listings, absent on the placement receipt.
    pub bet_title: Option<String>,
    pub outcome_id: i64,
    pub outcome_label: Option<String>,
    pub odds_snapshot: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboResponse {
    pub id: i64,
    pub stake: Decimal,
    pub total_odds: Decimal,
    pub potential_win: Decimal,
    pub status: String,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    pub selections: Vec<ComboSelectionResponse>,
}

impl From<ComboView> for ComboResponse {
    fn from(view: ComboView) -> Self {
        let selections = view
            .selections
            .into_iter()
            .map(|s| ComboSelectionResponse {
                bet_id: s.selection.bet_id,
                bet_title: Some(s.bet_title),
                outcome_id: s.selection.outcome_id,
                outcome_label: Some(s.outcome_label),
                odds_snapshot: s.selection.odds_snapshot,
            })
            .collect();
        Self {
            id: view.combo.id,
            stake: view.combo.stake,
            total_odds: view.combo.total_odds,
            potential_win: view.combo.potential_win,
            status: view.combo.status.as_str().to_string(),
            placed_at: view.combo.placed_at,
            settled_at: view.combo.settled_at,
            selections,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceComboResponse {
    pub combo: ComboResponse,
    pub new_balance: Decimal,
}

impl From<ComboReceipt> for PlaceComboResponse {
    fn from(receipt: ComboReceipt) -> Self {
        let selections = receipt
            .selections
            .into_iter()
            .map(|s| ComboSelectionResponse {
                bet_id: s.bet_id,
                bet_title: None,
                outcome_id: s.outcome_id,
                outcome_label: None,
                odds_snapshot: s.odds_snapshot,
            })
            .collect();
        Self {
            combo: ComboResponse {
                id: receipt.combo.id,
                stake: receipt.combo.stake,
                total_odds: receipt.combo.total_odds,
                potential_win: receipt.combo.potential_win,
                status: receipt.combo.status.as_str().to_string(),
                placed_at: receipt.combo.placed_at,
                settled_at: receipt.combo.settled_at,
                selections,
            },
            new_balance: receipt.new_balance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub scanned: u64,
    pub won: u64,
    pub lost: u64,
    pub still_pending: u64,
    pub settled: u64,
}

impl From<SweepReport> for SweepResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            scanned: report.scanned,
            won: report.won,
            lost: report.lost,
            still_pending: report.still_pending,
            settled: report.settled(),
        }
    }
}

// ============================================================================
// Settlement Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub bet_id: i64,
    pub winning_outcome_id: i64,
    pub wagers_won: u64,
    pub wagers_lost: u64,
    pub total_paid: Decimal,
    pub combos_won: u64,
    pub combos_lost: u64,
    pub combos_pending: u64,
}

impl From<SettlementReport> for SettlementResponse {
    fn from(report: SettlementReport) -> Self {
        Self {
            bet_id: report.bet_id,
            winning_outcome_id: report.winning_outcome_id,
            wagers_won: report.wagers_won,
            wagers_lost: report.wagers_lost,
            total_paid: report.total_paid,
            combos_won: report.combos_won,
            combos_lost: report.combos_lost,
            combos_pending: report.combos_pending,
        }
    }
}

// ============================================================================
// Wallet Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub to_username: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub amount: Decimal,
    pub counterparty_id: Option<i64>,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<i64>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount,
            counterparty_id: tx.counterparty_id,
            status: tx.status.as_str().to_string(),
            requested_at: tx.requested_at,
            processed_at: tx.processed_at,
            processed_by: tx.processed_by,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub status: Option<String>,
}

// ============================================================================
// Casino Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRoundRequest {
    pub game: String,
    pub stake: Decimal,
    #[serde(default)]
    pub pick: Option<RoulettePick>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResponse {
    pub id: i64,
    pub game: String,
    pub stake: Decimal,
    pub win_amount: Decimal,
    pub status: String,
    pub game_data: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl From<CasinoRound> for RoundResponse {
    fn from(round: CasinoRound) -> Self {
        Self {
            id: round.id,
            game: round.game.as_str().to_string(),
            stake: round.stake,
            win_amount: round.win_amount,
            status: round.status.as_str().to_string(),
            game_data: round.game_data,
            started_at: round.started_at,
            settled_at: round.settled_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRoundResponse {
    pub round: RoundResponse,
    pub new_balance: Decimal,
}

impl From<RoundReceipt> for StartRoundResponse {
    fn from(receipt: RoundReceipt) -> Self {
        Self {
            round: receipt.round.into(),
            new_balance: receipt.new_balance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StepEventResponse {
    #[serde(rename_all = "camelCase")]
    Gem { revealed: u32, multiplier: Decimal },
    #[serde(rename_all = "camelCase")]
    Bomb { revealed: u32 },
    #[serde(rename_all = "camelCase")]
    Wheel { rolled: u8, win_amount: Decimal },
}

impl From<StepEvent> for StepEventResponse {
    fn from(event: StepEvent) -> Self {
        match event {
            StepEvent::Gem {
                revealed,
                multiplier,
            } => Self::Gem {
                revealed,
                multiplier,
            },
            StepEvent::Bomb { revealed } => Self::Bomb { revealed },
            StepEvent::Wheel { rolled, win_amount } => Self::Wheel { rolled, win_amount },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub round_id: i64,
    pub status: String,
    pub event: StepEventResponse,
    /// Set when the step settled the round with a credit.
    pub new_balance: Option<Decimal>,
}

impl From<StepReceipt> for StepResponse {
    fn from(receipt: StepReceipt) -> Self {
        Self {
            round_id: receipt.round_id,
            status: receipt.status.as_str().to_string(),
            event: receipt.event.into(),
            new_balance: receipt.new_balance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashoutResponse {
    pub round_id: i64,
    pub multiplier: Decimal,
    pub win_amount: Decimal,
    pub new_balance: Decimal,
}

impl From<CashoutReceipt> for CashoutResponse {
    fn from(receipt: CashoutReceipt) -> Self {
        Self {
            round_id: receipt.round_id,
            multiplier: receipt.multiplier,
            win_amount: receipt.win_amount,
            new_balance: receipt.new_balance,
        }
    }
}

// ============================================================================
// Quote Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub symbol: String,
    pub price: Decimal,
    pub change_pct: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            symbol: quote.symbol,
            price: quote.price,
            change_pct: quote.change_pct,
            updated_at: quote.updated_at,
        }
    }
}

// ============================================================================
// Health Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
    pub uptime_secs: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn create_bet_request_defaults_optional_fields() {
        let payload = json!({
            "title": "Grand final",
            "outcomes": [
                { "label": "Red", "odds": "1.80" },
                { "label": "Blue", "odds": "2.10" }
            ]
        });

        let parsed: CreateBetRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.outcomes.len(), 2);
        assert!(parsed.minimum_bet.is_none());
        assert!(parsed.parent_bet_id.is_none());
        assert!(parsed.details.is_empty());
    }

    #[test]
    fn transfer_request_reads_camel_case() {
        let payload = json!({ "toUsername": "alice", "amount": "250.00" });
        let parsed: TransferRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.to_username, "alice");
        assert_eq!(parsed.amount, dec!(250.00));
    }

    #[test]
    fn step_event_serializes_with_type_tag() {
        let event = StepEventResponse::Wheel {
            rolled: 17,
            win_amount: dec!(72.00),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "wheel");
        assert_eq!(value["rolled"], 17);
    }
}
