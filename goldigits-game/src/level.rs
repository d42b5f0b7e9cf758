//! Difficulty levels and the per-level session budgets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Named difficulty tier selected on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Easy,
    Medium,
    Hard,
}

impl Level {
    /// All levels in ascending difficulty order.
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Canonical display name, matching the wire format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    /// Session budget for this level.
    #[must_use]
    pub fn profile(self) -> &'static LevelProfile {
        level_catalog().profile(self)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name does not match a known tier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid game level '{0}': must be Easy, Medium, or Hard")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Easy" => Ok(Self::Easy),
            "Medium" => Ok(Self::Medium),
            "Hard" => Ok(Self::Hard),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

/// Static configuration fixing time, lives, clear target, and the ranked-score
/// deduction for one difficulty tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProfile {
    pub level: Level,
    /// Countdown granted to every question, in seconds.
    pub time_limit_seconds: u32,
    /// Session-wide pool of lives.
    pub max_attempts: u32,
    /// Correct answers needed to clear the session.
    pub required_correct: u32,
    /// Ranked-score deduction per attempt beyond the first.
    pub score_deduction: u32,
}

/// Errors raised when the level catalog violates its invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelCatalogError {
    #[error("missing profile for level {0}")]
    MissingProfile(Level),
    #[error("duplicate profile for level {0}")]
    DuplicateProfile(Level),
    #[error("{field} must be positive for level {level}")]
    ZeroBudget { level: Level, field: &'static str },
}

/// Complete set of level profiles; exactly one per level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCatalog {
    profiles: Vec<LevelProfile>,
}

impl LevelCatalog {
    fn builtin() -> Self {
        Self {
            profiles: vec![
                LevelProfile {
                    level: Level::Easy,
                    time_limit_seconds: 40,
                    max_attempts: 40,
                    required_correct: 5,
                    score_deduction: 5,
                },
                LevelProfile {
                    level: Level::Medium,
                    time_limit_seconds: 30,
                    max_attempts: 30,
                    required_correct: 7,
                    score_deduction: 10,
                },
                LevelProfile {
                    level: Level::Hard,
                    time_limit_seconds: 20,
                    max_attempts: 20,
                    required_correct: 10,
                    score_deduction: 15,
                },
            ],
        }
    }

    /// Load a catalog from a JSON override, validating completeness.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the catalog is
    /// incomplete or self-contradictory.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        catalog.validate().map_err(|e| e.to_string())?;
        Ok(catalog)
    }

    /// Validate the one-profile-per-level invariant and budget sanity.
    ///
    /// # Errors
    ///
    /// Returns a `LevelCatalogError` naming the first violation found.
    pub fn validate(&self) -> Result<(), LevelCatalogError> {
        for level in Level::ALL {
            let mut matches = self.profiles.iter().filter(|p| p.level == level);
            let Some(profile) = matches.next() else {
                return Err(LevelCatalogError::MissingProfile(level));
            };
            if matches.next().is_some() {
                return Err(LevelCatalogError::DuplicateProfile(level));
            }
            for (field, value) in [
                ("time_limit_seconds", profile.time_limit_seconds),
                ("max_attempts", profile.max_attempts),
                ("required_correct", profile.required_correct),
                ("score_deduction", profile.score_deduction),
            ] {
                if value == 0 {
                    return Err(LevelCatalogError::ZeroBudget { level, field });
                }
            }
        }
        Ok(())
    }

    /// Profile for a given level.
    ///
    /// # Panics
    ///
    /// Panics when the catalog is missing the level; `validate` rules this
    /// out for any catalog obtained through the public constructors.
    #[must_use]
    pub fn profile(&self, level: Level) -> &LevelProfile {
        self.profiles
            .iter()
            .find(|p| p.level == level)
            .unwrap_or_else(|| panic!("level catalog missing {level}"))
    }
}

/// Shared, validated catalog of the three built-in levels.
pub fn level_catalog() -> &'static LevelCatalog {
    static CATALOG: OnceLock<LevelCatalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let catalog = LevelCatalog::builtin();
        catalog
            .validate()
            .unwrap_or_else(|err| panic!("invalid built-in level catalog: {err}"));
        catalog
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_expected_budgets() {
        let easy = Level::Easy.profile();
        assert_eq!(easy.time_limit_seconds, 40);
        assert_eq!(easy.max_attempts, 40);
        assert_eq!(easy.required_correct, 5);
        assert_eq!(easy.score_deduction, 5);

        let hard = Level::Hard.profile();
        assert_eq!(hard.time_limit_seconds, 20);
        assert_eq!(hard.required_correct, 10);
        assert_eq!(hard.score_deduction, 15);
    }

    #[test]
    fn level_parses_canonical_names_only() {
        assert_eq!("Easy".parse::<Level>().unwrap(), Level::Easy);
        assert_eq!(" Medium ".parse::<Level>().unwrap(), Level::Medium);
        assert!("easy".parse::<Level>().is_err());
        assert!("Extreme".parse::<Level>().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_and_missing_profiles() {
        let mut catalog = LevelCatalog::builtin();
        let dup = catalog.profiles[0].clone();
        catalog.profiles.push(dup);
        assert_eq!(
            catalog.validate(),
            Err(LevelCatalogError::DuplicateProfile(Level::Easy))
        );

        catalog.profiles.retain(|p| p.level != Level::Easy);
        assert_eq!(
            catalog.validate(),
            Err(LevelCatalogError::MissingProfile(Level::Easy))
        );
    }

    #[test]
    fn validate_rejects_zero_budgets() {
        let mut catalog = LevelCatalog::builtin();
        catalog.profiles[1].required_correct = 0;
        assert!(matches!(
            catalog.validate(),
            Err(LevelCatalogError::ZeroBudget {
                level: Level::Medium,
                field: "required_correct"
            })
        ));
    }
}
