//! Centralized balance and tuning constants for Golden Digits game logic.
//!
//! These values define the deterministic math for session scoring. Keeping
//! them together ensures that gameplay can only be adjusted via code changes
//! reviewed in version control, rather than through external assets.

// Scoring ------------------------------------------------------------------
/// Server-assigned baseline award for every correct guess.
pub const BASE_AWARD: u32 = 100;
/// Floor applied to the attempt-penalized ranked score.
pub const MIN_RANKED_SCORE: u32 = 10;
/// Ceiling of the ranked score (a one-attempt clear).
pub const MAX_RANKED_SCORE: u32 = 100;
/// Chance per correct answer that the lightning bonus fires.
pub const LIGHTNING_CHANCE: f32 = 0.3;
/// Dampening factor in the consistency-bonus floor formula.
pub const CONSISTENCY_FACTOR: f32 = 0.9;

// Puzzle provider ----------------------------------------------------------
/// Answer digit of the fixed fallback puzzle served when the provider fails.
pub const FALLBACK_DIGIT: u8 = 5;
/// Image handle of the fixed fallback puzzle.
pub const FALLBACK_IMAGE_HANDLE: &str = "https://marcconrad.com/uob/banana/q/1.jpg";
/// Highest digit a puzzle answer or guess may carry.
pub const MAX_DIGIT: u8 = 9;

// Default bonus-table values -----------------------------------------------
pub(crate) const DEFAULT_SCORE_MULTIPLIER: f32 = 1.05;
pub(crate) const DEFAULT_TIME_BONUS_SECONDS: f32 = 10.0;
pub(crate) const DEFAULT_LIFE_BONUS: f32 = 5.0;
pub(crate) const DEFAULT_LIGHTNING_POINTS: f32 = 50.0;
pub(crate) const DEFAULT_CONSECUTIVE_STEP: f32 = 10.0;
