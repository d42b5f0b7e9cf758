use std::cell::RefCell;
use std::convert::Infallible;

use goldigits_game::{
    GameId, GameSession, GuessOutcome, Level, MemoryScoreStore, Puzzle, QuestionSource, RngBundle,
    SessionError, SessionStatus, TerminationCause, TickOutcome, UserId, WeatherModifier,
};

/// Source that serves a scripted cycle of puzzles.
struct SequenceSource {
    digits: Vec<u8>,
    cursor: RefCell<usize>,
}

impl SequenceSource {
    fn new(digits: Vec<u8>) -> Self {
        Self {
            digits,
            cursor: RefCell::new(0),
        }
    }
}

impl QuestionSource for SequenceSource {
    type Error = Infallible;

    fn fetch(&self) -> Result<Puzzle, Self::Error> {
        let mut cursor = self.cursor.borrow_mut();
        let digit = self.digits[*cursor % self.digits.len()];
        *cursor += 1;
        Ok(Puzzle {
            id: format!("q-{cursor}", cursor = *cursor),
            image_handle: format!("img-{digit}"),
            correct_digit: digit,
        })
    }
}

fn start(
    level: Level,
    source: &SequenceSource,
) -> (GameSession, MemoryScoreStore, RngBundle) {
    let store = MemoryScoreStore::new();
    let rngs = RngBundle::from_user_seed(11);
    let session = GameSession::start(
        GameId(0xA1),
        Some(UserId("runner".to_string())),
        level.profile().clone(),
        WeatherModifier::none(),
        source,
    )
    .unwrap();
    (session, store, rngs)
}

#[test]
fn session_walks_fresh_puzzles_between_questions() {
    let source = SequenceSource::new(vec![1, 2, 3]);
    let (mut session, store, rngs) = start(Level::Easy, &source);

    assert_eq!(session.current_puzzle().unwrap().correct_digit, 1);
    session.submit_guess(1, &source, &store, &rngs).unwrap();
    assert_eq!(session.current_puzzle().unwrap().correct_digit, 2);
    session.submit_guess(2, &source, &store, &rngs).unwrap();
    assert_eq!(session.current_puzzle().unwrap().correct_digit, 3);
    assert_eq!(session.correct_count(), 2);
    assert_eq!(session.status(), SessionStatus::Active);
}

#[test]
fn attempt_exhaustion_terminates_with_incomplete_record() {
    let source = SequenceSource::new(vec![7]);
    let (mut session, store, rngs) = start(Level::Hard, &source);

    for n in 0u32..20 {
        let outcome = session.submit_guess(0, &source, &store, &rngs).unwrap();
        match outcome {
            GuessOutcome::Incorrect {
                attempts_remaining,
                terminated,
            } => {
                assert_eq!(attempts_remaining, 19 - n);
                assert_eq!(terminated, n == 19);
            }
            GuessOutcome::Correct { .. } => panic!("oracle digit never matches"),
        }
    }
    assert_eq!(session.termination(), Some(TerminationCause::OutOfAttempts));
    let record = store.last_record().unwrap();
    assert!(!record.completed);
    assert_eq!(record.attempts, 20);
    // Hard deduction drives the ranked score to its floor.
    assert_eq!(record.score, 10);
}

#[test]
fn stale_tokens_from_before_a_transition_never_fire() {
    let source = SequenceSource::new(vec![4]);
    let (mut session, store, rngs) = start(Level::Easy, &source);

    let before_answer = session.clock_token().unwrap();
    session.submit_guess(4, &source, &store, &rngs).unwrap();
    assert_eq!(session.tick(before_answer, &store), TickOutcome::Ignored);
    assert_eq!(session.seconds_remaining(), 40);

    let fresh = session.clock_token().unwrap();
    assert!(matches!(
        session.tick(fresh, &store),
        TickOutcome::Counted {
            seconds_remaining: 39
        }
    ));
}

#[test]
fn whichever_trigger_fires_first_wins_termination() {
    let source = SequenceSource::new(vec![9]);
    let (mut session, store, rngs) = start(Level::Hard, &source);

    let token = session.clock_token().unwrap();
    for _ in 0..20 {
        let _ = session.tick(token, &store);
    }
    assert_eq!(session.termination(), Some(TerminationCause::TimeExpired));

    // The losing trigger observes Terminated and must not mutate anything.
    let err = session.submit_guess(9, &source, &store, &rngs).unwrap_err();
    assert_eq!(err, SessionError::Terminated);
    assert_eq!(session.tick(token, &store), TickOutcome::Ignored);
    assert_eq!(store.len(), 1);
}

#[test]
fn budgets_never_go_negative_under_adversarial_sequences() {
    let source = SequenceSource::new(vec![6]);
    let (mut session, store, rngs) = start(Level::Hard, &source);
    let token = session.clock_token().unwrap();

    for step in 0..200u32 {
        if step % 2 == 0 {
            let _ = session.tick(token, &store);
        } else {
            let _ = session.submit_guess(0, &source, &store, &rngs);
        }
        assert!(session.seconds_remaining() <= 20);
        assert!(session.attempts_remaining() <= 20);
    }
    assert!(session.is_terminated());
    assert_eq!(store.len(), 1);
}

#[test]
fn abandonment_stops_the_clock_and_is_idempotent() {
    let source = SequenceSource::new(vec![2]);
    let (mut session, store, _) = start(Level::Medium, &source);
    let token = session.clock_token().unwrap();

    session.terminate(&store);
    assert_eq!(session.status(), SessionStatus::Terminated);
    assert_eq!(session.clock_token(), None);
    assert_eq!(session.tick(token, &store), TickOutcome::Ignored);
    assert!(session.current_puzzle().is_none());

    session.terminate(&store);
    assert_eq!(store.len(), 1);
}
