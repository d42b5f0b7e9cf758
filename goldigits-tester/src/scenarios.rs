//! Scenario catalog: named scripted runs with their expected outcomes.

use goldigits_game::{BonusKind, Level, TerminationCause, WeatherModifier};

use crate::harness::{GuessPolicy, RunOutcome};

/// Expected end state of a scenario; `None` fields are not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expectations {
    pub cause: Option<TerminationCause>,
    pub ranked_score: Option<u32>,
    pub display_score: Option<u32>,
    /// Inclusive bounds for stochastic display scores.
    pub display_range: Option<(u32, u32)>,
}

/// One named scripted run.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub level: Level,
    pub policy: GuessPolicy,
    pub modifier: WeatherModifier,
    pub expect: Expectations,
}

/// All scenarios the harness knows how to run.
#[must_use]
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "smoke",
            description: "Easy clear with first-try answers and no modifier",
            level: Level::Easy,
            policy: GuessPolicy::AlwaysCorrect,
            modifier: WeatherModifier::none(),
            expect: Expectations {
                cause: Some(TerminationCause::Completed),
                ranked_score: Some(80),
                display_score: Some(500),
                display_range: None,
            },
        },
        Scenario {
            name: "streak",
            description: "Medium clear under the consecutive bonus",
            level: Level::Medium,
            policy: GuessPolicy::AlwaysCorrect,
            modifier: WeatherModifier {
                kind: BonusKind::ConsecutiveBonus,
                value: 10.0,
            },
            expect: Expectations {
                cause: Some(TerminationCause::Completed),
                ranked_score: Some(40),
                // 7 awards of 100 plus a 0..=6 streak ramp of 10 each.
                display_score: Some(910),
                display_range: None,
            },
        },
        Scenario {
            name: "grind",
            description: "Easy clear with one miss before every answer",
            level: Level::Easy,
            policy: GuessPolicy::WrongThenRight,
            modifier: WeatherModifier::none(),
            expect: Expectations {
                cause: Some(TerminationCause::Completed),
                ranked_score: Some(55),
                display_score: Some(500),
                display_range: None,
            },
        },
        Scenario {
            name: "exhaustion",
            description: "Hard session that burns every life",
            level: Level::Hard,
            policy: GuessPolicy::AlwaysWrong,
            modifier: WeatherModifier::none(),
            expect: Expectations {
                cause: Some(TerminationCause::OutOfAttempts),
                ranked_score: Some(10),
                display_score: Some(0),
                display_range: None,
            },
        },
        Scenario {
            name: "timeout",
            description: "Easy session that never guesses and times out",
            level: Level::Easy,
            policy: GuessPolicy::Idle,
            modifier: WeatherModifier::none(),
            expect: Expectations {
                cause: Some(TerminationCause::TimeExpired),
                ranked_score: Some(100),
                display_score: Some(0),
                display_range: None,
            },
        },
        Scenario {
            name: "lightning",
            description: "Medium clear under the stochastic lightning bonus",
            level: Level::Medium,
            policy: GuessPolicy::AlwaysCorrect,
            modifier: WeatherModifier {
                kind: BonusKind::LightningBonus,
                value: 50.0,
            },
            expect: Expectations {
                cause: Some(TerminationCause::Completed),
                ranked_score: Some(40),
                // Stochastic display score; bounds are checked instead.
                display_score: None,
                display_range: Some((700, 1050)),
            },
        },
    ]
}

/// Look up a scenario by name.
#[must_use]
pub fn get(name: &str) -> Option<Scenario> {
    catalog().into_iter().find(|s| s.name == name)
}

/// Compare a run outcome against the scenario's expectations.
#[must_use]
pub fn evaluate(scenario: &Scenario, outcome: &RunOutcome) -> Vec<String> {
    let mut failures = outcome.violations.clone();
    if let Some(expected) = scenario.expect.cause
        && outcome.cause != Some(expected)
    {
        failures.push(format!(
            "expected termination {expected:?}, got {actual:?}",
            actual = outcome.cause
        ));
    }
    if let Some(expected) = scenario.expect.ranked_score
        && outcome.ranked_score != Some(expected)
    {
        failures.push(format!(
            "expected ranked score {expected}, got {actual:?}",
            actual = outcome.ranked_score
        ));
    }
    if let Some(expected) = scenario.expect.display_score
        && outcome.display_score != expected
    {
        failures.push(format!(
            "expected display score {expected}, got {actual}",
            actual = outcome.display_score
        ));
    }
    if let Some((low, high)) = scenario.expect.display_range
        && !(low..=high).contains(&outcome.display_score)
    {
        failures.push(format!(
            "display score {actual} outside [{low}, {high}]",
            actual = outcome.display_score
        ));
    }
    failures
}
