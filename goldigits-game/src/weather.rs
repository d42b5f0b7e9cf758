//! Weather-derived session bonuses.
//!
//! A weather report observed on the dashboard is classified into a condition
//! class, which the bonus table maps to the single scoring/time/life modifier
//! carried by the session. The modifier is immutable once captured.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::{
    DEFAULT_CONSECUTIVE_STEP, DEFAULT_LIFE_BONUS, DEFAULT_LIGHTNING_POINTS,
    DEFAULT_SCORE_MULTIPLIER, DEFAULT_TIME_BONUS_SECONDS,
};

/// Kind of scoring/time/life perturbation a session carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum BonusKind {
    #[default]
    None,
    /// Multiplies the base award for every correct answer.
    ScoreMultiplier,
    /// Adds seconds to every per-question countdown.
    TimeBonus,
    /// Adds lives to the session pool at start.
    LifeBonus,
    /// Flat bonus points awarded with a fixed chance per correct answer.
    LightningBonus,
    /// Floor formula that never beats the base award; kept as shipped.
    ConsistencyBonus,
    /// Flat bonus points per prior consecutive correct answer.
    ConsecutiveBonus,
}

impl BonusKind {
    /// Whether the kind adjusts the award of each correct answer.
    #[must_use]
    pub const fn affects_scoring(self) -> bool {
        matches!(
            self,
            Self::ScoreMultiplier
                | Self::LightningBonus
                | Self::ConsistencyBonus
                | Self::ConsecutiveBonus
        )
    }
}

/// Session-scoped modifier captured once per dashboard visit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherModifier {
    pub kind: BonusKind,
    pub value: f32,
}

impl WeatherModifier {
    /// Modifier that leaves the session untouched.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: BonusKind::None,
            value: 0.0,
        }
    }

    /// Extra seconds granted to every countdown, zero unless a time bonus.
    #[must_use]
    pub fn extra_seconds(&self) -> u32 {
        match self.kind {
            BonusKind::TimeBonus => round_non_negative(self.value),
            _ => 0,
        }
    }

    /// Extra lives granted at session start, zero unless a life bonus.
    #[must_use]
    pub fn extra_attempts(&self) -> u32 {
        match self.kind {
            BonusKind::LifeBonus => round_non_negative(self.value),
            _ => 0,
        }
    }
}

impl Default for WeatherModifier {
    fn default() -> Self {
        Self::none()
    }
}

pub(crate) fn round_non_negative(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

/// Condition classes the bonus table keys off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionClass {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
    Foggy,
    Night,
    Normal,
}

const CONDITION_ORDER: [ConditionClass; 8] = [
    ConditionClass::Sunny,
    ConditionClass::Cloudy,
    ConditionClass::Rainy,
    ConditionClass::Snowy,
    ConditionClass::Stormy,
    ConditionClass::Foggy,
    ConditionClass::Night,
    ConditionClass::Normal,
];

impl ConditionClass {
    /// Classify a provider condition string plus day flag.
    ///
    /// Matching mirrors the dashboard service: night wins outright, then the
    /// first matching substring family, then the neutral fallback.
    #[must_use]
    pub fn classify(condition: &str, is_day: bool) -> Self {
        if !is_day {
            return Self::Night;
        }
        let lower = condition.to_lowercase();
        let has = |needle: &str| lower.contains(needle);
        if has("sunny") || has("clear") {
            Self::Sunny
        } else if has("cloud") || has("overcast") {
            Self::Cloudy
        } else if has("rain") || has("drizzle") {
            Self::Rainy
        } else if has("snow") || has("sleet") || has("ice") {
            Self::Snowy
        } else if has("thunder") || has("storm") {
            Self::Stormy
        } else if has("fog") || has("mist") {
            Self::Foggy
        } else {
            Self::Normal
        }
    }
}

/// Weather observation handed in by the dashboard's provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub condition: String,
    pub is_day: bool,
    pub temperature_c: f32,
}

impl WeatherReport {
    /// Default report used when the provider is unreachable.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            condition: "Sunny".to_string(),
            is_day: true,
            temperature_c: 20.0,
        }
    }
}

/// Mapping from condition class to session modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTable {
    pub entries: HashMap<ConditionClass, WeatherModifier>,
}

impl BonusTable {
    /// Load a bonus table from JSON, validating completeness.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON string cannot be parsed or if validation
    /// fails.
    pub fn from_json(json_str: &str) -> Result<Self, String> {
        let table: Self =
            serde_json::from_str(json_str).map_err(|e| format!("JSON parse error: {e}"))?;
        table.validate()?;
        Ok(table)
    }

    /// Validate table completeness and value sanity.
    fn validate(&self) -> Result<(), String> {
        for class in CONDITION_ORDER {
            let Some(modifier) = self.entries.get(&class) else {
                return Err(format!("Missing bonus entry for condition: {class:?}"));
            };
            if !modifier.value.is_finite() || modifier.value < 0.0 {
                return Err(format!(
                    "Bonus value for {class:?} must be finite and non-negative"
                ));
            }
        }
        Ok(())
    }

    /// Built-in default table.
    #[must_use]
    pub fn default_table() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            ConditionClass::Sunny,
            WeatherModifier {
                kind: BonusKind::ScoreMultiplier,
                value: DEFAULT_SCORE_MULTIPLIER,
            },
        );
        entries.insert(
            ConditionClass::Cloudy,
            WeatherModifier {
                kind: BonusKind::ConsistencyBonus,
                value: crate::constants::CONSISTENCY_FACTOR,
            },
        );
        entries.insert(
            ConditionClass::Rainy,
            WeatherModifier {
                kind: BonusKind::TimeBonus,
                value: DEFAULT_TIME_BONUS_SECONDS,
            },
        );
        entries.insert(
            ConditionClass::Snowy,
            WeatherModifier {
                kind: BonusKind::LifeBonus,
                value: DEFAULT_LIFE_BONUS,
            },
        );
        entries.insert(
            ConditionClass::Stormy,
            WeatherModifier {
                kind: BonusKind::LightningBonus,
                value: DEFAULT_LIGHTNING_POINTS,
            },
        );
        entries.insert(ConditionClass::Foggy, WeatherModifier::none());
        entries.insert(
            ConditionClass::Night,
            WeatherModifier {
                kind: BonusKind::ConsecutiveBonus,
                value: DEFAULT_CONSECUTIVE_STEP,
            },
        );
        entries.insert(ConditionClass::Normal, WeatherModifier::none());
        Self { entries }
    }

    /// Modifier for an observed report.
    #[must_use]
    pub fn modifier_for(&self, report: &WeatherReport) -> WeatherModifier {
        let class = ConditionClass::classify(&report.condition, report.is_day);
        self.entries
            .get(&class)
            .copied()
            .unwrap_or_else(WeatherModifier::none)
    }
}

impl Default for BonusTable {
    fn default() -> Self {
        Self::default_table()
    }
}
