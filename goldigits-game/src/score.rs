//! Scoring math for both tracks.
//!
//! The display score sums weather-adjusted per-question awards; the ranked
//! score is the attempt-penalized value persisted at termination. The two are
//! intentionally independent.

use rand::Rng;

use crate::constants::{BASE_AWARD, CONSISTENCY_FACTOR, LIGHTNING_CHANCE, MIN_RANKED_SCORE};
use crate::level::LevelProfile;
use crate::rng::RngBundle;
use crate::weather::{BonusKind, WeatherModifier, round_non_negative};

/// Weather-adjusted award for one correct answer.
///
/// `streak_before` is the consecutive-correct count prior to this answer;
/// the session increments its streak only after this computation.
#[must_use]
pub fn award_for_correct(
    modifier: &WeatherModifier,
    streak_before: u32,
    rngs: &RngBundle,
) -> u32 {
    let base = BASE_AWARD;
    match modifier.kind {
        BonusKind::ScoreMultiplier => {
            let scaled = (base as f32) * modifier.value;
            if scaled.is_finite() && scaled > 0.0 {
                scaled.round() as u32
            } else {
                0
            }
        }
        BonusKind::LightningBonus => {
            let mut rng = rngs.lightning();
            if rng.r#gen::<f32>() < LIGHTNING_CHANCE {
                base + round_non_negative(modifier.value)
            } else {
                base
            }
        }
        // max(round(base * 0.9), base): the floor never beats the base award.
        // Kept exactly as shipped.
        BonusKind::ConsistencyBonus => {
            let dampened = ((base as f32) * CONSISTENCY_FACTOR).round();
            dampened.max(base as f32) as u32
        }
        BonusKind::ConsecutiveBonus => {
            base + streak_before.saturating_mul(round_non_negative(modifier.value))
        }
        BonusKind::None | BonusKind::TimeBonus | BonusKind::LifeBonus => base,
    }
}

/// Attempt-penalized ranked score persisted once per completed session.
///
/// `attempts_used` counts every guess across the session; sessions that
/// terminate before any guess are charged a single attempt.
#[must_use]
pub fn ranked_score(attempts_used: u32, profile: &LevelProfile) -> u32 {
    let attempts = attempts_used.max(1);
    let deduction = (attempts - 1).saturating_mul(profile.score_deduction);
    BASE_AWARD.saturating_sub(deduction).max(MIN_RANKED_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    fn modifier(kind: BonusKind, value: f32) -> WeatherModifier {
        WeatherModifier { kind, value }
    }

    #[test]
    fn score_multiplier_is_deterministic() {
        let rngs = RngBundle::from_user_seed(1);
        let m = modifier(BonusKind::ScoreMultiplier, 1.05);
        for _ in 0..5 {
            assert_eq!(award_for_correct(&m, 0, &rngs), 105);
        }
    }

    #[test]
    fn consistency_bonus_is_a_floor_that_never_beats_base() {
        let rngs = RngBundle::from_user_seed(1);
        let m = modifier(BonusKind::ConsistencyBonus, 0.9);
        assert_eq!(award_for_correct(&m, 0, &rngs), 100);
        assert_eq!(award_for_correct(&m, 7, &rngs), 100);
    }

    #[test]
    fn consecutive_bonus_scales_with_prior_streak() {
        let rngs = RngBundle::from_user_seed(1);
        let m = modifier(BonusKind::ConsecutiveBonus, 10.0);
        assert_eq!(award_for_correct(&m, 0, &rngs), 100);
        assert_eq!(award_for_correct(&m, 1, &rngs), 110);
        assert_eq!(award_for_correct(&m, 4, &rngs), 140);
    }

    #[test]
    fn lightning_bonus_is_seed_stable_and_two_valued() {
        let m = modifier(BonusKind::LightningBonus, 50.0);
        let first = RngBundle::from_user_seed(99);
        let second = RngBundle::from_user_seed(99);
        let mut hits = 0;
        let mut misses = 0;
        for _ in 0..200 {
            let a = award_for_correct(&m, 0, &first);
            let b = award_for_correct(&m, 0, &second);
            assert_eq!(a, b, "same seed must replay the same awards");
            match a {
                150 => hits += 1,
                100 => misses += 1,
                other => panic!("unexpected award {other}"),
            }
        }
        assert!(hits > 0, "lightning never fired in 200 draws");
        assert!(misses > 0, "lightning fired on every draw");
    }

    #[test]
    fn neutral_kinds_award_base() {
        let rngs = RngBundle::from_user_seed(1);
        for kind in [BonusKind::None, BonusKind::TimeBonus, BonusKind::LifeBonus] {
            assert_eq!(award_for_correct(&modifier(kind, 42.0), 3, &rngs), 100);
        }
    }

    #[test]
    fn ranked_score_penalizes_attempts_with_floor() {
        let easy = Level::Easy.profile();
        let hard = Level::Hard.profile();
        assert_eq!(ranked_score(1, easy), 100);
        assert_eq!(ranked_score(5, easy), 80);
        assert_eq!(ranked_score(30, hard), 10);
        // Zero guesses are charged as a single attempt.
        assert_eq!(ranked_score(0, easy), 100);
    }
}
