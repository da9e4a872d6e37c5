//! Odds and money arithmetic for the wagering engine
//!
//! Every monetary figure in the system is a 2-decimal Decimal; every odds
//! value stays inside [MIN_ODDS, MAX_ODDS]. All rounding goes through
//! `round2` so the whole crate agrees on half-away-from-zero cents.

use rust_decimal::{Decimal, RoundingStrategy};

// =============================================================================
// Constants
// =============================================================================

/// Multiplier applied to the backed outcome after an accepted wager (0.97)
pub const BACKED_FACTOR: Decimal = Decimal::from_parts(97, 0, 0, false, 2);

/// Multiplier applied to every other outcome of the bet (1.02)
pub const UNBACKED_FACTOR: Decimal = Decimal::from_parts(102, 0, 0, false, 2);

/// Floor for any outcome odds (1.05)
pub const MIN_ODDS: Decimal = Decimal::from_parts(105, 0, 0, false, 2);

/// Ceiling for any outcome odds (25.00)
pub const MAX_ODDS: Decimal = Decimal::from_parts(2500, 0, 0, false, 2);

/// Bonus multiplier applied to a combo's odds product (1.15)
pub const COMBO_BONUS: Decimal = Decimal::from_parts(115, 0, 0, false, 2);

/// Smallest number of legs a combo may carry
pub const MIN_COMBO_SELECTIONS: usize = 2;

// =============================================================================
// Money helpers
// =============================================================================

/// Round to cents, half away from zero
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// True when the amount carries no sub-cent precision
pub fn has_cent_precision(amount: Decimal) -> bool {
    amount == round2(amount)
}

/// Ledger amount validity: strictly positive, whole cents
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && has_cent_precision(amount)
}

// =============================================================================
// Repricing
// =============================================================================

/// Clamp odds into the allowed band
pub fn clamp_odds(odds: Decimal) -> Decimal {
    odds.max(MIN_ODDS).min(MAX_ODDS)
}

/// True for odds an author may assign at creation time. The runtime clamp
/// keeps odds inside the band from then on, so creation enforces the same
/// band rather than the bare `> 1`.
pub fn is_valid_author_odds(odds: Decimal) -> bool {
    odds >= MIN_ODDS && odds <= MAX_ODDS && has_cent_precision(odds)
}

/// New odds for the outcome the wager backed
pub fn reprice_backed(odds: Decimal) -> Decimal {
    clamp_odds(round2(odds * BACKED_FACTOR))
}

/// New odds for every other outcome of the bet
pub fn reprice_unbacked(odds: Decimal) -> Decimal {
    clamp_odds(round2(odds * UNBACKED_FACTOR))
}

/// Reprice a whole bet after an accepted wager on `backed_outcome_id`.
/// Returns (outcome id, new odds) for every outcome, in input order.
pub fn reprice_bet(outcomes: &[(i64, Decimal)], backed_outcome_id: i64) -> Vec<(i64, Decimal)> {
    outcomes
        .iter()
        .map(|&(id, odds)| {
            if id == backed_outcome_id {
                (id, reprice_backed(odds))
            } else {
                (id, reprice_unbacked(odds))
            }
        })
        .collect()
}

// =============================================================================
// Payout figures
// =============================================================================

/// Fixed-odds win for a single wager
pub fn potential_win(stake: Decimal, odds: Decimal) -> Decimal {
    round2(stake * odds)
}

/// Combined odds for a combo: unrounded product of the leg snapshots,
/// bonus applied after the product. Only the final win figure is rounded.
pub fn combo_total_odds(leg_odds: &[Decimal]) -> Decimal {
    let product: Decimal = leg_odds.iter().copied().product();
    product * COMBO_BONUS
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(2.005)), dec!(2.01));
        assert_eq!(round2(dec!(2.004)), dec!(2.00));
        assert_eq!(round2(dec!(-2.005)), dec!(-2.01));
        // 1.80 * 0.97 = 1.746 -> 1.75
        assert_eq!(round2(dec!(1.746)), dec!(1.75));
    }

    #[test]
    fn test_amount_validity() {
        assert!(is_valid_amount(dec!(0.01)));
        assert!(is_valid_amount(dec!(10)));
        assert!(is_valid_amount(dec!(10.50)));
        assert!(!is_valid_amount(dec!(0)));
        assert!(!is_valid_amount(dec!(-5)));
        assert!(!is_valid_amount(dec!(10.005)));
        // trailing zeros beyond cents are still whole cents
        assert!(is_valid_amount(dec!(10.500)));
    }

    #[test]
    fn test_reprice_example() {
        // backed 2.00 * 0.97 = 1.94; other 1.80 * 1.02 = 1.836 -> 1.84
        let repriced = reprice_bet(&[(1, dec!(2.00)), (2, dec!(1.80))], 1);
        assert_eq!(repriced, vec![(1, dec!(1.94)), (2, dec!(1.84))]);
    }

    #[test]
    fn test_reprice_clamps_low() {
        // 1.07 * 0.97 = 1.0379 -> 1.04 -> clamped to 1.05
        assert_eq!(reprice_backed(dec!(1.07)), dec!(1.05));
        // floor is sticky: 1.05 * 0.97 = 1.0185 -> 1.02 -> 1.05
        assert_eq!(reprice_backed(dec!(1.05)), dec!(1.05));
    }

    #[test]
    fn test_reprice_clamps_high() {
        // 24.80 * 1.02 = 25.296 -> 25.30 -> clamped to 25.00
        assert_eq!(reprice_unbacked(dec!(24.80)), dec!(25.00));
        assert_eq!(reprice_unbacked(dec!(25.00)), dec!(25.00));
    }

    #[test]
    fn test_reprice_never_leaves_band() {
        let mut odds = dec!(1.80);
        for _ in 0..200 {
            odds = reprice_backed(odds);
            assert!(odds >= MIN_ODDS && odds <= MAX_ODDS);
        }
        assert_eq!(odds, MIN_ODDS);

        let mut odds = dec!(1.80);
        for _ in 0..200 {
            odds = reprice_unbacked(odds);
            assert!(odds >= MIN_ODDS && odds <= MAX_ODDS);
        }
        assert_eq!(odds, MAX_ODDS);
    }

    #[test]
    fn test_potential_win() {
        // 2000 * 1.80 = 3600.00
        assert_eq!(potential_win(dec!(2000), dec!(1.80)), dec!(3600.00));
        // rounding only at the end: 33.33 * 1.94 = 64.6602 -> 64.66
        assert_eq!(potential_win(dec!(33.33), dec!(1.94)), dec!(64.66));
    }

    #[test]
    fn test_combo_total_odds() {
        // 1.5 * 2.0 * 1.8 = 5.4; 5.4 * 1.15 = 6.21
        let total = combo_total_odds(&[dec!(1.5), dec!(2.0), dec!(1.8)]);
        assert_eq!(total, dec!(6.21));
        // win figure rounds the unrounded total
        assert_eq!(potential_win(dec!(1000), total), dec!(6210.00));
    }

    #[test]
    fn test_combo_bonus_after_product() {
        // (1.33 * 1.57) = 2.0881; * 1.15 = 2.401315 (kept unrounded)
        let total = combo_total_odds(&[dec!(1.33), dec!(1.57)]);
        assert_eq!(total, dec!(2.401315));
        // 100 * 2.401315 = 240.1315 -> 240.13
        assert_eq!(potential_win(dec!(100), total), dec!(240.13));
    }

    #[test]
    fn test_author_odds_band() {
        assert!(is_valid_author_odds(dec!(1.05)));
        assert!(is_valid_author_odds(dec!(25.00)));
        assert!(!is_valid_author_odds(dec!(1.04)));
        assert!(!is_valid_author_odds(dec!(25.01)));
        assert!(!is_valid_author_odds(dec!(2.125)));
    }
}
