//! Golden Digits Game Engine
//!
//! Platform-agnostic core game logic for the Golden Digits arithmetic puzzle
//! game. This crate provides the session state machine, level catalog,
//! weather-bonus system, scoring, and the typed session control surface,
//! without UI or platform-specific dependencies.

pub mod clock;
pub mod constants;
pub mod level;
pub mod puzzle;
pub mod recorder;
pub mod rng;
pub mod score;
pub mod service;
pub mod session;
pub mod weather;

// Re-export commonly used types
pub use clock::{SessionClock, TickToken};
pub use level::{Level, LevelCatalog, LevelProfile, UnknownLevel, level_catalog};
pub use puzzle::{FixedSource, PayloadError, Puzzle, WithFallback, decode_csv_payload};
pub use recorder::{MemoryScoreStore, ScoreRecord, ScoreRow};
pub use rng::{CountingRng, RngBundle};
pub use score::{award_for_correct, ranked_score};
pub use service::{
    ApiError, GameService, ScoreboardEntry, StartGameRequest, StartGameResponse,
    SubmitAnswerRequest, SubmitAnswerResponse, SubmitScoreRequest,
};
pub use session::{
    GameId, GameSession, GuessOutcome, GuessRecord, SessionError, SessionStatus,
    TerminationCause, TickOutcome, UserId,
};
pub use weather::{BonusKind, BonusTable, ConditionClass, WeatherModifier, WeatherReport};

/// Trait for abstracting the puzzle provider.
/// Platform-specific implementations should provide this; `WithFallback`
/// wraps any implementation with the contract's fallback substitution.
pub trait QuestionSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the next puzzle from the provider.
    ///
    /// # Errors
    ///
    /// Returns an error only when even the implementation's own fallback
    /// handling cannot produce a puzzle.
    fn fetch(&self) -> Result<Puzzle, Self::Error>;
}

/// Trait for persisting the final score record of a terminated session.
pub trait ScoreRecorder {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist one score record. Invoked at most once per session.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted; sessions treat
    /// this as best-effort and never roll back.
    fn record(&self, record: &ScoreRecord) -> Result<(), Self::Error>;
}

/// Trait for the leaderboard-serving side of the score store.
pub trait ScoreStore: ScoreRecorder {
    /// Whether the store can currently accept session traffic.
    fn is_ready(&self) -> bool {
        true
    }

    /// Every persisted score, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the query.
    fn all_scores(&self) -> Result<Vec<ScoreRow>, Self::Error>;

    /// One user's scores, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the query.
    fn scores_for_user(&self, user: &UserId) -> Result<Vec<ScoreRow>, Self::Error>;
}
