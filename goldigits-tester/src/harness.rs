//! Pure-logic session driver: scripted guess policies over a deterministic
//! puzzle oracle, with invariant checks on every step.

use std::cell::RefCell;
use std::convert::Infallible;

use goldigits_game::{
    GameId, GameSession, MemoryScoreStore, Puzzle, QuestionSource, RngBundle, TerminationCause,
    TickOutcome, UserId,
};

use crate::scenarios::Scenario;

/// Deterministic puzzle oracle; the answer stream depends only on the seed.
pub struct OracleSource {
    seed: u64,
    served: RefCell<u64>,
}

impl OracleSource {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            served: RefCell::new(0),
        }
    }
}

impl QuestionSource for OracleSource {
    type Error = Infallible;

    fn fetch(&self) -> Result<Puzzle, Self::Error> {
        let mut served = self.served.borrow_mut();
        *served += 1;
        let digit = ((self.seed.wrapping_add(*served).wrapping_mul(7)) % 10) as u8;
        Ok(Puzzle {
            id: format!("oracle-{n}", n = *served),
            image_handle: format!("oracle://question/{n}", n = *served),
            correct_digit: digit,
        })
    }
}

/// How the scripted player behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessPolicy {
    /// Answer every question correctly on the first try.
    AlwaysCorrect,
    /// Miss once, then answer correctly, on every question.
    WrongThenRight,
    /// Never answer correctly.
    AlwaysWrong,
    /// Never guess at all; let the countdown run out.
    Idle,
}

/// Outcome of one scripted session run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub cause: Option<TerminationCause>,
    pub display_score: u32,
    pub ranked_score: Option<u32>,
    pub attempts_used: u32,
    pub records_written: usize,
    pub violations: Vec<String>,
}

/// Drive one session to termination under a scenario's policy.
pub fn run_session(scenario: &Scenario, seed: u64) -> RunOutcome {
    let source = OracleSource::new(seed);
    let store = MemoryScoreStore::new();
    let rngs = RngBundle::from_user_seed(seed);
    let profile = scenario.level.profile().clone();
    let time_budget = profile.time_limit_seconds + scenario.modifier.extra_seconds();
    let attempt_budget = profile.max_attempts + scenario.modifier.extra_attempts();

    let mut violations = Vec::new();
    let mut session = match GameSession::start(
        GameId(seed),
        Some(UserId(format!("qa-{seed}"))),
        profile,
        scenario.modifier,
        &source,
    ) {
        Ok(session) => session,
        Err(err) => {
            return RunOutcome {
                cause: None,
                display_score: 0,
                ranked_score: None,
                attempts_used: 0,
                records_written: 0,
                violations: vec![format!("session failed to start: {err}")],
            };
        }
    };

    let mut last_display = session.display_score();
    let mut steps = 0u32;
    // Generous upper bound; a healthy session terminates long before it.
    let step_limit = 10_000;

    while !session.is_terminated() {
        steps += 1;
        if steps > step_limit {
            violations.push("session failed to terminate within the step limit".to_string());
            break;
        }

        match scenario.policy {
            GuessPolicy::Idle => {
                let Some(token) = session.clock_token() else {
                    violations.push("active session has no running clock".to_string());
                    break;
                };
                if session.tick(token, &store) == TickOutcome::Ignored {
                    violations.push("current token was ignored while active".to_string());
                    break;
                }
            }
            policy => {
                let Some(correct) = session.current_puzzle().map(|p| p.correct_digit) else {
                    violations.push("active session has no current puzzle".to_string());
                    break;
                };
                let guess = match policy {
                    GuessPolicy::AlwaysCorrect => correct,
                    GuessPolicy::AlwaysWrong => (correct + 1) % 10,
                    GuessPolicy::WrongThenRight => {
                        let miss = (correct + 1) % 10;
                        if let Err(err) = session.submit_guess(miss, &source, &store, &rngs) {
                            violations.push(format!("scripted miss rejected: {err}"));
                            break;
                        }
                        if session.is_terminated() {
                            break;
                        }
                        correct
                    }
                    GuessPolicy::Idle => unreachable!("handled above"),
                };
                if let Err(err) = session.submit_guess(guess, &source, &store, &rngs) {
                    violations.push(format!("scripted guess rejected: {err}"));
                    break;
                }
            }
        }

        check_step_invariants(
            &session,
            &store,
            time_budget,
            attempt_budget,
            &mut last_display,
            &mut violations,
        );
        if !violations.is_empty() {
            break;
        }
    }

    if session.is_terminated() && store.len() != 1 {
        violations.push(format!(
            "terminated session wrote {count} records instead of 1",
            count = store.len()
        ));
    }

    RunOutcome {
        cause: session.termination(),
        display_score: session.display_score(),
        ranked_score: store.last_record().map(|record| record.score),
        attempts_used: session.attempts_used(),
        records_written: store.len(),
        violations,
    }
}

fn check_step_invariants(
    session: &GameSession,
    store: &MemoryScoreStore,
    time_budget: u32,
    attempt_budget: u32,
    last_display: &mut u32,
    violations: &mut Vec<String>,
) {
    if session.seconds_remaining() > time_budget {
        violations.push(format!(
            "seconds remaining {remaining} exceeds budget {time_budget}",
            remaining = session.seconds_remaining()
        ));
    }
    if session.attempts_remaining() > attempt_budget {
        violations.push(format!(
            "attempts remaining {remaining} exceeds budget {attempt_budget}",
            remaining = session.attempts_remaining()
        ));
    }
    if session.display_score() < *last_display {
        violations.push("display score decreased".to_string());
    }
    *last_display = session.display_score();
    if store.len() > 1 {
        violations.push("more than one score record written".to_string());
    }
    if !session.is_terminated() && !store.is_empty() {
        violations.push("score record written before termination".to_string());
    }
}
