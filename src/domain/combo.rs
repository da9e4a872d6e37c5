use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Combination wager settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComboStatus {
    /// At least one leg's bet is still open
    Pending,
    /// Every leg matched its bet's result; total win credited once
    Won,
    /// At least one settled leg missed
    Lost,
}

impl ComboStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComboStatus::Pending => "PENDING",
            ComboStatus::Won => "WON",
            ComboStatus::Lost => "LOST",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ComboStatus::Won | ComboStatus::Lost)
    }
}

impl std::fmt::Display for ComboStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for ComboStatus {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(ComboStatus::Pending),
            "WON" => Ok(ComboStatus::Won),
            "LOST" => Ok(ComboStatus::Lost),
            _ => Err(format!("Unknown combo status: {}", s)),
        }
    }
}

/// A combination wager across two or more distinct bets.
///
/// `total_odds` is the unrounded product of the leg odds snapshots times
/// the combo bonus; only the final win figure is rounded to cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combo {
    pub id: i64,
    pub user_id: i64,
    pub stake: Decimal,
    pub total_odds: Decimal,
    pub potential_win: Decimal,
    pub status: ComboStatus,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// One leg of a combo: an outcome picked on one bet, with the odds frozen
/// at placement time. Legs never feed the repricing engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboSelection {
    pub id: i64,
    pub combo_id: i64,
    pub bet_id: i64,
    pub outcome_id: i64,
    pub odds_snapshot: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_terminal_states() {
        assert!(!ComboStatus::Pending.is_terminal());
        assert!(ComboStatus::Won.is_terminal());
        assert!(ComboStatus::Lost.is_terminal());
    }
}
