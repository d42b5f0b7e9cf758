//! The per-session state machine: lifecycle, guess handling, countdown, and
//! exactly-once termination.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

use crate::clock::{SessionClock, TickToken};
use crate::constants::MAX_DIGIT;
use crate::level::LevelProfile;
use crate::puzzle::Puzzle;
use crate::recorder::ScoreRecord;
use crate::rng::RngBundle;
use crate::score::{award_for_correct, ranked_score};
use crate::weather::{BonusKind, WeatherModifier};
use crate::{QuestionSource, ScoreRecorder};

/// Opaque identifier of an authenticated player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one session, minted from the id stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl GameId {
    /// Mint a fresh id from the bundle's minting stream.
    #[must_use]
    pub fn mint(rngs: &RngBundle) -> Self {
        Self(rngs.minting().next_u64())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Lifecycle states. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Fetching the first puzzle.
    Loading,
    /// Awaiting a guess, clock running.
    Active,
    /// Between questions while the next puzzle is fetched, clock stopped.
    Paused,
    /// Immutable; the score record has been offered exactly once.
    Terminated,
}

/// Why a session became immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationCause {
    /// Required correct count reached.
    Completed,
    OutOfAttempts,
    TimeExpired,
    /// Explicit external termination (navigation away, logout).
    Abandoned,
}

/// Ledger entry for one guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub digit: u8,
    pub seconds_remaining: u32,
    pub correct: bool,
}

/// Guess ledger kept inline for typical session lengths.
pub type GuessLog = SmallVec<[GuessRecord; 8]>;

/// Result of an accepted guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Incorrect {
        attempts_remaining: u32,
        terminated: bool,
    },
    Correct {
        awarded: u32,
        completed: bool,
    },
}

/// Result of presenting a clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale token or session no longer active; nothing changed.
    Ignored,
    Counted { seconds_remaining: u32 },
    /// Countdown hit zero and the session terminated.
    Expired,
}

/// Errors surfaced by session operations. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("answer must be a number between 0 and 9 (got {0})")]
    DigitOutOfRange(u8),
    #[error("game is already completed")]
    Terminated,
    #[error("session is not awaiting a guess")]
    NotActive,
    #[error("puzzle provider unreachable: {0}")]
    Upstream(String),
}

/// One play-through from level selection to termination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    id: GameId,
    user_id: Option<UserId>,
    profile: LevelProfile,
    modifier: WeatherModifier,
    status: SessionStatus,
    current_puzzle: Option<Puzzle>,
    attempts_remaining: u32,
    seconds_remaining: u32,
    correct_count: u32,
    display_score: u32,
    consecutive_correct: u32,
    guesses: GuessLog,
    clock: SessionClock,
    termination: Option<TerminationCause>,
    recorded: bool,
}

impl GameSession {
    /// Start a session: apply the one-shot time/life grants, fetch the first
    /// puzzle, and begin the countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Upstream` when the question source fails even
    /// after its own fallback handling; no session exists in that case.
    pub fn start<Q: QuestionSource>(
        id: GameId,
        user_id: Option<UserId>,
        profile: LevelProfile,
        modifier: WeatherModifier,
        source: &Q,
    ) -> Result<Self, SessionError> {
        let mut session = Self {
            id,
            user_id,
            attempts_remaining: profile
                .max_attempts
                .saturating_add(modifier.extra_attempts()),
            seconds_remaining: profile
                .time_limit_seconds
                .saturating_add(modifier.extra_seconds()),
            profile,
            modifier,
            status: SessionStatus::Loading,
            current_puzzle: None,
            correct_count: 0,
            display_score: 0,
            consecutive_correct: 0,
            guesses: GuessLog::new(),
            clock: SessionClock::new(),
            termination: None,
            recorded: false,
        };
        let puzzle = source
            .fetch()
            .map_err(|err| SessionError::Upstream(err.to_string()))?;
        session.current_puzzle = Some(puzzle);
        session.status = SessionStatus::Active;
        session.clock.restart();
        Ok(session)
    }

    /// Submit a guess against the current puzzle.
    ///
    /// # Errors
    ///
    /// Rejects without mutating state when the session is not `Active` or the
    /// digit is out of range.
    pub fn submit_guess<Q, R>(
        &mut self,
        digit: u8,
        source: &Q,
        recorder: &R,
        rngs: &RngBundle,
    ) -> Result<GuessOutcome, SessionError>
    where
        Q: QuestionSource,
        R: ScoreRecorder,
    {
        match self.status {
            SessionStatus::Terminated => return Err(SessionError::Terminated),
            SessionStatus::Active => {}
            SessionStatus::Loading | SessionStatus::Paused => {
                return Err(SessionError::NotActive);
            }
        }
        if digit > MAX_DIGIT {
            return Err(SessionError::DigitOutOfRange(digit));
        }
        let Some(puzzle) = self.current_puzzle.as_ref() else {
            return Err(SessionError::NotActive);
        };
        let correct = digit == puzzle.correct_digit;
        self.guesses.push(GuessRecord {
            digit,
            seconds_remaining: self.seconds_remaining,
            correct,
        });

        if !correct {
            self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
            if self.modifier.kind == BonusKind::ConsecutiveBonus {
                self.consecutive_correct = 0;
            }
            if self.attempts_remaining == 0 {
                self.enter_terminated(TerminationCause::OutOfAttempts, recorder);
                return Ok(GuessOutcome::Incorrect {
                    attempts_remaining: 0,
                    terminated: true,
                });
            }
            return Ok(GuessOutcome::Incorrect {
                attempts_remaining: self.attempts_remaining,
                terminated: false,
            });
        }

        // Clock stops while the next puzzle is fetched so provider latency
        // never eats into the player's countdown.
        self.status = SessionStatus::Paused;
        self.clock.cancel();
        let awarded = award_for_correct(&self.modifier, self.consecutive_correct, rngs);
        self.display_score = self.display_score.saturating_add(awarded);
        self.correct_count += 1;
        self.consecutive_correct += 1;
        self.current_puzzle = None;

        if self.correct_count >= self.profile.required_correct {
            self.enter_terminated(TerminationCause::Completed, recorder);
            return Ok(GuessOutcome::Correct {
                awarded,
                completed: true,
            });
        }

        let next = match source.fetch() {
            Ok(puzzle) => puzzle,
            Err(err) => {
                log::warn!("puzzle fetch failed mid-session, serving fallback: {err}");
                Puzzle::fallback()
            }
        };
        self.current_puzzle = Some(next);
        // Every question gets a fresh full countdown, time bonus included.
        self.seconds_remaining = self.question_seconds();
        self.status = SessionStatus::Active;
        self.clock.restart();
        Ok(GuessOutcome::Correct {
            awarded,
            completed: false,
        })
    }

    /// Present one countdown tick. Stale tokens and non-active states no-op.
    pub fn tick<R: ScoreRecorder>(&mut self, token: TickToken, recorder: &R) -> TickOutcome {
        if self.status != SessionStatus::Active || !self.clock.accepts(token) {
            return TickOutcome::Ignored;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.enter_terminated(TerminationCause::TimeExpired, recorder);
            return TickOutcome::Expired;
        }
        TickOutcome::Counted {
            seconds_remaining: self.seconds_remaining,
        }
    }

    /// Explicit external termination. Idempotent; a second call is a no-op.
    pub fn terminate<R: ScoreRecorder>(&mut self, recorder: &R) {
        if self.status == SessionStatus::Terminated {
            return;
        }
        self.enter_terminated(TerminationCause::Abandoned, recorder);
    }

    fn enter_terminated<R: ScoreRecorder>(&mut self, cause: TerminationCause, recorder: &R) {
        self.status = SessionStatus::Terminated;
        self.termination = Some(cause);
        self.clock.cancel();
        self.current_puzzle = None;
        if self.recorded {
            return;
        }
        self.recorded = true;
        // A missing identifier is not an error; the record is skipped.
        let Some(user_id) = self.user_id.clone() else {
            return;
        };
        let attempts = self.attempts_used().max(1);
        let record = ScoreRecord {
            user_id,
            game_id: self.id,
            level: self.profile.level,
            score: ranked_score(attempts, &self.profile),
            attempts,
            completed: matches!(cause, TerminationCause::Completed),
        };
        if let Err(err) = recorder.record(&record) {
            log::warn!("failed to persist score for game {}: {err}", self.id);
        }
    }

    fn question_seconds(&self) -> u32 {
        self.profile
            .time_limit_seconds
            .saturating_add(self.modifier.extra_seconds())
    }

    #[must_use]
    pub const fn id(&self) -> GameId {
        self.id
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    #[must_use]
    pub const fn profile(&self) -> &LevelProfile {
        &self.profile
    }

    #[must_use]
    pub const fn modifier(&self) -> &WeatherModifier {
        &self.modifier
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self.status, SessionStatus::Terminated)
    }

    #[must_use]
    pub const fn termination(&self) -> Option<TerminationCause> {
        self.termination
    }

    #[must_use]
    pub const fn current_puzzle(&self) -> Option<&Puzzle> {
        self.current_puzzle.as_ref()
    }

    #[must_use]
    pub const fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    #[must_use]
    pub const fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    #[must_use]
    pub const fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub const fn display_score(&self) -> u32 {
        self.display_score
    }

    #[must_use]
    pub const fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }

    /// Total guesses made so far.
    #[must_use]
    pub fn attempts_used(&self) -> u32 {
        u32::try_from(self.guesses.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn guesses(&self) -> &[GuessRecord] {
        &self.guesses
    }

    /// Token the host's timer must present with each scheduled tick; `None`
    /// whenever the clock is stopped.
    #[must_use]
    pub const fn clock_token(&self) -> Option<TickToken> {
        self.clock.token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::puzzle::FixedSource;
    use crate::recorder::MemoryScoreStore;

    fn fixed_source(digit: u8) -> FixedSource {
        FixedSource::new(Puzzle {
            id: "t".to_string(),
            image_handle: "img".to_string(),
            correct_digit: digit,
        })
    }

    fn start_easy(modifier: WeatherModifier) -> (GameSession, FixedSource, MemoryScoreStore, RngBundle) {
        let source = fixed_source(3);
        let store = MemoryScoreStore::new();
        let rngs = RngBundle::from_user_seed(7);
        let session = GameSession::start(
            GameId(1),
            Some(UserId("u1".to_string())),
            Level::Easy.profile().clone(),
            modifier,
            &source,
        )
        .unwrap();
        (session, source, store, rngs)
    }

    #[test]
    fn start_applies_level_budgets() {
        let (session, _, _, _) = start_easy(WeatherModifier::none());
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.attempts_remaining(), 40);
        assert_eq!(session.seconds_remaining(), 40);
        assert!(session.current_puzzle().is_some());
        assert!(session.clock_token().is_some());
    }

    #[test]
    fn start_applies_time_and_life_grants_once() {
        let time = WeatherModifier {
            kind: BonusKind::TimeBonus,
            value: 10.0,
        };
        let (session, _, _, _) = start_easy(time);
        assert_eq!(session.seconds_remaining(), 50);
        assert_eq!(session.attempts_remaining(), 40);

        let life = WeatherModifier {
            kind: BonusKind::LifeBonus,
            value: 5.0,
        };
        let (session, _, _, _) = start_easy(life);
        assert_eq!(session.attempts_remaining(), 45);
        assert_eq!(session.seconds_remaining(), 40);
    }

    #[test]
    fn out_of_range_guess_mutates_nothing() {
        let (mut session, source, store, rngs) = start_easy(WeatherModifier::none());
        let err = session.submit_guess(10, &source, &store, &rngs).unwrap_err();
        assert_eq!(err, SessionError::DigitOutOfRange(10));
        assert_eq!(session.attempts_remaining(), 40);
        assert_eq!(session.seconds_remaining(), 40);
        assert_eq!(session.display_score(), 0);
        assert_eq!(session.attempts_used(), 0);
    }

    #[test]
    fn wrong_guess_burns_an_attempt() {
        let (mut session, source, store, rngs) = start_easy(WeatherModifier::none());
        let outcome = session.submit_guess(4, &source, &store, &rngs).unwrap();
        assert_eq!(
            outcome,
            GuessOutcome::Incorrect {
                attempts_remaining: 39,
                terminated: false
            }
        );
        assert_eq!(session.display_score(), 0);
    }

    #[test]
    fn correct_guess_pays_and_resets_the_countdown() {
        let (mut session, source, store, rngs) = start_easy(WeatherModifier::none());
        let token = session.clock_token().unwrap();
        for _ in 0..10 {
            let _ = session.tick(token, &store);
        }
        assert_eq!(session.seconds_remaining(), 30);

        let outcome = session.submit_guess(3, &source, &store, &rngs).unwrap();
        assert_eq!(
            outcome,
            GuessOutcome::Correct {
                awarded: 100,
                completed: false
            }
        );
        assert_eq!(session.seconds_remaining(), 40);
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.display_score(), 100);
        // The pre-pause token went stale with the clock restart.
        assert_eq!(session.tick(token, &store), TickOutcome::Ignored);
    }

    #[test]
    fn clearing_the_level_records_the_ranked_score_once() {
        let (mut session, source, store, rngs) = start_easy(WeatherModifier::none());
        for _ in 0..5 {
            session.submit_guess(3, &source, &store, &rngs).unwrap();
        }
        assert!(session.is_terminated());
        assert_eq!(session.termination(), Some(TerminationCause::Completed));
        assert_eq!(store.len(), 1);
        let record = store.last_record().unwrap();
        assert_eq!(record.score, 80);
        assert_eq!(record.attempts, 5);
        assert!(record.completed);

        // Absorbing state: further operations reject and never re-record.
        let err = session.submit_guess(3, &source, &store, &rngs).unwrap_err();
        assert_eq!(err, SessionError::Terminated);
        session.terminate(&store);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn countdown_expiry_terminates_regardless_of_pending_input() {
        let (mut session, _, store, _) = start_easy(WeatherModifier::none());
        let token = session.clock_token().unwrap();
        for _ in 0..39 {
            assert!(matches!(
                session.tick(token, &store),
                TickOutcome::Counted { .. }
            ));
        }
        assert_eq!(session.tick(token, &store), TickOutcome::Expired);
        assert_eq!(session.termination(), Some(TerminationCause::TimeExpired));
        assert_eq!(session.tick(token, &store), TickOutcome::Ignored);
        assert_eq!(store.len(), 1);
        assert!(!store.last_record().unwrap().completed);
    }

    #[test]
    fn terminate_twice_records_once() {
        let (mut session, _, store, _) = start_easy(WeatherModifier::none());
        session.terminate(&store);
        session.terminate(&store);
        assert_eq!(store.len(), 1);
        assert_eq!(session.termination(), Some(TerminationCause::Abandoned));
        // Zero guesses are charged as one attempt in the record.
        assert_eq!(store.last_record().unwrap().attempts, 1);
    }

    #[test]
    fn anonymous_sessions_skip_the_record_silently() {
        let source = fixed_source(3);
        let store = MemoryScoreStore::new();
        let mut session = GameSession::start(
            GameId(2),
            None,
            Level::Easy.profile().clone(),
            WeatherModifier::none(),
            &source,
        )
        .unwrap();
        session.terminate(&store);
        assert!(session.is_terminated());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn recorder_failure_is_swallowed_and_not_retried() {
        #[derive(Debug)]
        struct FailingRecorder;

        #[derive(Debug, thiserror::Error)]
        #[error("store rejected the write")]
        struct WriteRejected;

        impl crate::ScoreRecorder for FailingRecorder {
            type Error = WriteRejected;

            fn record(&self, _record: &ScoreRecord) -> Result<(), Self::Error> {
                Err(WriteRejected)
            }
        }

        let source = fixed_source(3);
        let recorder = FailingRecorder;
        let mut session = GameSession::start(
            GameId(3),
            Some(UserId("u1".to_string())),
            Level::Easy.profile().clone(),
            WeatherModifier::none(),
            &source,
        )
        .unwrap();
        session.terminate(&recorder);
        assert!(session.is_terminated());
        // A failed write never rolls the session back or retries.
        session.terminate(&recorder);
        assert_eq!(session.termination(), Some(TerminationCause::Abandoned));
    }

    #[test]
    fn consecutive_streak_resets_on_wrong_guess() {
        let modifier = WeatherModifier {
            kind: BonusKind::ConsecutiveBonus,
            value: 10.0,
        };
        let (mut session, source, store, rngs) = start_easy(modifier);
        let first = session.submit_guess(3, &source, &store, &rngs).unwrap();
        assert_eq!(
            first,
            GuessOutcome::Correct {
                awarded: 100,
                completed: false
            }
        );
        let second = session.submit_guess(3, &source, &store, &rngs).unwrap();
        assert_eq!(
            second,
            GuessOutcome::Correct {
                awarded: 110,
                completed: false
            }
        );
        session.submit_guess(4, &source, &store, &rngs).unwrap();
        assert_eq!(session.consecutive_correct(), 0);
        let fresh = session.submit_guess(3, &source, &store, &rngs).unwrap();
        assert_eq!(
            fresh,
            GuessOutcome::Correct {
                awarded: 100,
                completed: false
            }
        );
    }
}
