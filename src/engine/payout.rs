//! Casino payout tables
//!
//! Pure lookups only; the draws themselves happen in the round engine.
//! Gems multipliers come from a fixed ladder indexed by revealed count,
//! roulette from the classic single-zero table.

use rust_decimal::Decimal;

use crate::domain::RoulettePick;
use crate::engine::odds::round2;

// =============================================================================
// Gems ladder
// =============================================================================

/// Multiplier by number of revealed gems. Index 0 is a cashout before any
/// reveal and returns exactly the stake. Steps past the end stay capped
/// at the last entry.
pub const GEMS_LADDER: [Decimal; 14] = [
    Decimal::from_parts(100, 0, 0, false, 2),  // 1.00
    Decimal::from_parts(120, 0, 0, false, 2),  // 1.20
    Decimal::from_parts(150, 0, 0, false, 2),  // 1.50
    Decimal::from_parts(190, 0, 0, false, 2),  // 1.90
    Decimal::from_parts(240, 0, 0, false, 2),  // 2.40
    Decimal::from_parts(310, 0, 0, false, 2),  // 3.10
    Decimal::from_parts(400, 0, 0, false, 2),  // 4.00
    Decimal::from_parts(520, 0, 0, false, 2),  // 5.20
    Decimal::from_parts(680, 0, 0, false, 2),  // 6.80
    Decimal::from_parts(890, 0, 0, false, 2),  // 8.90
    Decimal::from_parts(1160, 0, 0, false, 2), // 11.60
    Decimal::from_parts(1510, 0, 0, false, 2), // 15.10
    Decimal::from_parts(1970, 0, 0, false, 2), // 19.70
    Decimal::from_parts(2500, 0, 0, false, 2), // 25.00
];

/// Ladder multiplier for a revealed-gem count
pub fn gems_multiplier(revealed: u32) -> Decimal {
    let idx = (revealed as usize).min(GEMS_LADDER.len() - 1);
    GEMS_LADDER[idx]
}

/// Cashout credit for a gems round
pub fn gems_payout(stake: Decimal, revealed: u32) -> Decimal {
    round2(stake * gems_multiplier(revealed))
}

// =============================================================================
// Roulette table
// =============================================================================

/// Straight-up hit pays 35:1; the stake left the balance at round start,
/// so the single credit is 36x
pub const STRAIGHT_MULTIPLIER: Decimal = Decimal::from_parts(3600, 0, 0, false, 2);

/// Even-money picks credit 2x
pub const EVEN_MONEY_MULTIPLIER: Decimal = Decimal::from_parts(200, 0, 0, false, 2);

/// Red pockets of the single-zero wheel
const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

pub fn is_red(number: u8) -> bool {
    RED_NUMBERS.contains(&number)
}

/// True when the pick names a pocket that exists on the wheel
pub fn is_valid_pick(pick: RoulettePick) -> bool {
    match pick {
        RoulettePick::Straight(n) => n <= 36,
        _ => true,
    }
}

/// Whether a settled wheel number pays the pick. Zero loses every
/// even-money pick.
pub fn roulette_wins(pick: RoulettePick, rolled: u8) -> bool {
    match pick {
        RoulettePick::Straight(n) => rolled == n,
        RoulettePick::Red => rolled != 0 && is_red(rolled),
        RoulettePick::Black => rolled != 0 && !is_red(rolled),
        RoulettePick::Even => rolled != 0 && rolled % 2 == 0,
        RoulettePick::Odd => rolled % 2 == 1,
    }
}

/// Credit multiplier for a winning pick
pub fn roulette_multiplier(pick: RoulettePick) -> Decimal {
    match pick {
        RoulettePick::Straight(_) => STRAIGHT_MULTIPLIER,
        _ => EVEN_MONEY_MULTIPLIER,
    }
}

/// Credit for a settled spin; zero on a miss
pub fn roulette_payout(stake: Decimal, pick: RoulettePick, rolled: u8) -> Decimal {
    if roulette_wins(pick, rolled) {
        round2(stake * roulette_multiplier(pick))
    } else {
        Decimal::ZERO
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ladder_is_monotonic() {
        for pair in GEMS_LADDER.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(GEMS_LADDER[0], dec!(1.00));
    }

    #[test]
    fn test_ladder_caps_past_the_end() {
        let last = GEMS_LADDER[GEMS_LADDER.len() - 1];
        assert_eq!(gems_multiplier(13), last);
        assert_eq!(gems_multiplier(14), last);
        assert_eq!(gems_multiplier(500), last);
    }

    #[test]
    fn test_gems_payout() {
        // 3 gems -> 1.90x; 100 * 1.90 = 190.00
        assert_eq!(gems_payout(dec!(100), 3), dec!(190.00));
        // cashout with no reveals returns the stake
        assert_eq!(gems_payout(dec!(250.50), 0), dec!(250.50));
    }

    #[test]
    fn test_roulette_straight() {
        assert!(roulette_wins(RoulettePick::Straight(17), 17));
        assert!(!roulette_wins(RoulettePick::Straight(17), 18));
        // 10 * 36.00 = 360.00
        assert_eq!(roulette_payout(dec!(10), RoulettePick::Straight(17), 17), dec!(360.00));
        // straight on zero is a legal pick and pays like any number
        assert_eq!(roulette_payout(dec!(10), RoulettePick::Straight(0), 0), dec!(360.00));
    }

    #[test]
    fn test_roulette_even_money() {
        assert!(roulette_wins(RoulettePick::Red, 32));
        assert!(roulette_wins(RoulettePick::Black, 15));
        assert!(roulette_wins(RoulettePick::Even, 4));
        assert!(roulette_wins(RoulettePick::Odd, 9));
        // 50 * 2.00 = 100.00
        assert_eq!(roulette_payout(dec!(50), RoulettePick::Red, 32), dec!(100.00));
        assert_eq!(roulette_payout(dec!(50), RoulettePick::Red, 15), dec!(0));
    }

    #[test]
    fn test_zero_loses_even_money_picks() {
        assert!(!roulette_wins(RoulettePick::Red, 0));
        assert!(!roulette_wins(RoulettePick::Black, 0));
        assert!(!roulette_wins(RoulettePick::Even, 0));
        assert!(!roulette_wins(RoulettePick::Odd, 0));
    }

    #[test]
    fn test_pick_validity() {
        assert!(is_valid_pick(RoulettePick::Straight(0)));
        assert!(is_valid_pick(RoulettePick::Straight(36)));
        assert!(!is_valid_pick(RoulettePick::Straight(37)));
        assert!(is_valid_pick(RoulettePick::Black));
    }
}
