use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Casino game key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CasinoGame {
    /// Step game: reveal gems, cash out before hitting a bomb
    Gems,
    /// Single spin against a European wheel
    Roulette,
}

impl CasinoGame {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasinoGame::Gems => "GEMS",
            CasinoGame::Roulette => "ROULETTE",
        }
    }
}

impl std::fmt::Display for CasinoGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for CasinoGame {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "GEMS" => Ok(CasinoGame::Gems),
            "ROULETTE" => Ok(CasinoGame::Roulette),
            _ => Err(format!("Unknown casino game: {}", s)),
        }
    }
}

/// Round lifecycle. The stake is gone the moment a round starts; WON is
/// the only transition that credits anything back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoundStatus {
    Active,
    Won,
    Lost,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Active => "ACTIVE",
            RoundStatus::Won => "WON",
            RoundStatus::Lost => "LOST",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundStatus::Won | RoundStatus::Lost)
    }
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for RoundStatus {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(RoundStatus::Active),
            "WON" => Ok(RoundStatus::Won),
            "LOST" => Ok(RoundStatus::Lost),
            _ => Err(format!("Unknown round status: {}", s)),
        }
    }
}

/// One casino round. All progress lives server-side in `game_data`,
/// keyed by round id; nothing the client echoes is consulted for payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasinoRound {
    pub id: i64,
    pub user_id: i64,
    pub game: CasinoGame,
    pub stake: Decimal,
    pub win_amount: Decimal,
    pub status: RoundStatus,
    pub game_data: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Roulette pick, chosen at round start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "number", rename_all = "UPPERCASE")]
pub enum RoulettePick {
    /// Single number 0-36
    Straight(u8),
    Red,
    Black,
    Even,
    Odd,
}

/// Server-side state of a gems round, persisted in `game_data`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GemsData {
    /// Gems revealed so far
    pub revealed: u32,
    /// Full draw trail, true = gem
    pub trail: Vec<bool>,
    /// Ladder multiplier for the current `revealed` count
    pub multiplier: Decimal,
}

/// Server-side state of a roulette round, persisted in `game_data`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouletteData {
    pub pick: RoulettePick,
    /// Wheel result, set by the spin
    pub rolled: Option<u8>,
    /// Payout multiplier, zero until the spin wins
    pub multiplier: Decimal,
}
