use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bet lifecycle. Closing is irreversible; there is no reopen transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BetStatus {
    Open,
    Closed,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Open => "OPEN",
            BetStatus::Closed => "CLOSED",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, BetStatus::Open)
    }
}

impl std::fmt::Display for BetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for BetStatus {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "OPEN" => Ok(BetStatus::Open),
            "CLOSED" => Ok(BetStatus::Closed),
            _ => Err(format!("Unknown bet status: {}", s)),
        }
    }
}

/// Wager settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WagerStatus {
    /// Placed, bet not yet closed
    Pending,
    /// Backed outcome won; potential win credited
    Won,
    /// Backed outcome lost
    Lost,
}

impl WagerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WagerStatus::Pending => "PENDING",
            WagerStatus::Won => "WON",
            WagerStatus::Lost => "LOST",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WagerStatus::Won | WagerStatus::Lost)
    }
}

impl std::fmt::Display for WagerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for WagerStatus {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(WagerStatus::Pending),
            "WON" => Ok(WagerStatus::Won),
            "LOST" => Ok(WagerStatus::Lost),
            _ => Err(format!("Unknown wager status: {}", s)),
        }
    }
}

/// An admin-authored fixed-odds bet with 2-3 outcomes.
///
/// A bet may carry one level of detail bets: `parent_bet_id` points at the
/// main bet, and a detail bet can never be a parent itself. Detail bets
/// are wagered on and settled independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: i64,
    pub title: String,
    pub status: BetStatus,
    /// Winning outcome, set exactly once when the bet closes
    pub result_outcome_id: Option<i64>,
    /// Smallest accepted stake; zero means no floor
    pub minimum_bet: Decimal,
    pub parent_bet_id: Option<i64>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// One backable outcome of a bet.
///
/// `odds` move with every accepted wager; `total_stake` accumulates the
/// stakes backing this outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub id: i64,
    pub bet_id: i64,
    pub label: String,
    pub odds: Decimal,
    pub total_stake: Decimal,
    pub sort_order: i32,
}

/// A placed single wager. Stake, odds and potential win are immutable
/// snapshots from placement time; later repricing never touches them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wager {
    pub id: i64,
    pub user_id: i64,
    pub bet_id: i64,
    pub outcome_id: i64,
    pub stake: Decimal,
    pub odds_snapshot: Decimal,
    pub potential_win: Decimal,
    pub status: WagerStatus,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        assert_eq!(BetStatus::Open.as_str(), "OPEN");
        assert_eq!(WagerStatus::Won.to_string(), "WON");
        assert!(BetStatus::Open.is_open());
        assert!(!BetStatus::Closed.is_open());
    }

    #[test]
    fn test_wager_terminal_states() {
        assert!(!WagerStatus::Pending.is_terminal());
        assert!(WagerStatus::Won.is_terminal());
        assert!(WagerStatus::Lost.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(BetStatus::try_from("open").unwrap(), BetStatus::Open);
        assert_eq!(WagerStatus::try_from("WON").unwrap(), WagerStatus::Won);
        assert!(BetStatus::try_from("VOID").is_err());
    }
}
