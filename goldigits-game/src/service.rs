//! Transport-agnostic session control surface.
//!
//! `GameService` owns the live sessions for a host process and exposes the
//! typed request/response contracts the UI layer drives. It does no HTTP
//! framing; callers map `ApiError::status` onto whatever transport they use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::clock::TickToken;
use crate::constants::{MAX_DIGIT, MAX_RANKED_SCORE};
use crate::level::Level;
use crate::recorder::ScoreRecord;
use crate::rng::RngBundle;
use crate::session::{
    GameId, GameSession, GuessOutcome, SessionError, TickOutcome, UserId,
};
use crate::weather::WeatherModifier;
use crate::{QuestionSource, ScoreStore};

/// Display name substituted when a score row has no resolvable user.
const ANONYMOUS_NAME: &str = "Anonymous";

/// Error taxonomy of the control surface, mapped to status codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("user authentication required")]
    Unauthenticated,
    #[error("not authorized to access this game")]
    Forbidden,
    #[error("game not found")]
    NotFound,
    #[error("storage unavailable")]
    Storage,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP-equivalent status code for this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Storage | Self::Internal(_) => 500,
        }
    }
}

/// `POST /game/start` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartGameRequest {
    pub level: String,
    /// Modifier captured on the dashboard; sessions never read ambient state.
    #[serde(default)]
    pub modifier: WeatherModifier,
}

/// `POST /game/start` success payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartGameResponse {
    pub game_id: String,
    pub question: String,
    pub level: Level,
}

/// `POST /game/submit` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub game_id: String,
    pub answer: i64,
}

/// `POST /game/submit` success payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub correct: bool,
    /// Whether the session cleared its required correct count.
    pub completed: bool,
    /// Running display score after this guess.
    pub score: u32,
    /// Lives left in the session pool.
    pub attempts: u32,
}

/// `POST /scores` body (manual score submission).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitScoreRequest {
    pub user_id: String,
    pub game_id: String,
    pub score: u32,
    pub level: String,
}

/// Row of a leaderboard view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    pub name: String,
    pub level: Level,
    pub score: u32,
    pub attempts: u32,
    pub date: DateTime<Utc>,
}

/// Session control surface bound to one question source and one score store.
///
/// All operations take `&mut self`: callers serialize access, which is the
/// single-writer discipline the state machine requires.
#[derive(Debug)]
pub struct GameService<Q, S> {
    source: Q,
    store: S,
    rngs: RngBundle,
    sessions: HashMap<GameId, GameSession>,
    owners: HashMap<UserId, GameId>,
}

impl<Q, S> GameService<Q, S>
where
    Q: QuestionSource,
    S: ScoreStore,
{
    /// Build a service with a deterministic seed for id minting and bonus
    /// rolls.
    #[must_use]
    pub fn new(source: Q, store: S, seed: u64) -> Self {
        Self {
            source,
            store,
            rngs: RngBundle::from_user_seed(seed),
            sessions: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Start a session for an authenticated user. Any session the user still
    /// has running is terminated first; at most one is active per user.
    ///
    /// # Errors
    ///
    /// 401 without a user, 400 on an unknown level, 500 when storage is down
    /// or the question source fails even after fallback.
    pub fn start_game(
        &mut self,
        user: Option<&UserId>,
        request: &StartGameRequest,
    ) -> Result<StartGameResponse, ApiError> {
        let Some(user) = user else {
            return Err(ApiError::Unauthenticated);
        };
        let level: Level = request
            .level
            .parse()
            .map_err(|err: crate::level::UnknownLevel| ApiError::Validation(err.to_string()))?;
        if !self.store.is_ready() {
            return Err(ApiError::Storage);
        }

        if let Some(previous) = self.owners.remove(user)
            && let Some(session) = self.sessions.get_mut(&previous)
        {
            session.terminate(&self.store);
        }

        let id = self.mint_game_id();
        let session = GameSession::start(
            id,
            Some(user.clone()),
            level.profile().clone(),
            request.modifier,
            &self.source,
        )
        .map_err(|err| ApiError::Internal(format!("failed to start game: {err}")))?;

        let question = session
            .current_puzzle()
            .map(|p| p.image_handle.clone())
            .unwrap_or_default();
        self.sessions.insert(id, session);
        self.owners.insert(user.clone(), id);
        Ok(StartGameResponse {
            game_id: id.to_string(),
            question,
            level,
        })
    }

    /// Submit a guess for a running game.
    ///
    /// # Errors
    ///
    /// 400 on malformed ids, out-of-range answers, or finished games; 403
    /// when the caller does not own the game; 404 when the game is unknown.
    pub fn submit_answer(
        &mut self,
        user: Option<&UserId>,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ApiError> {
        let Some(user) = user else {
            return Err(ApiError::Unauthenticated);
        };
        let id = parse_game_id(&request.game_id)?;
        if request.answer < 0 || request.answer > i64::from(MAX_DIGIT) {
            return Err(ApiError::Validation(
                "answer must be a number between 0 and 9".to_string(),
            ));
        }
        let digit = request.answer as u8;

        let Some(session) = self.sessions.get_mut(&id) else {
            return Err(ApiError::NotFound);
        };
        if session.user_id() != Some(user) {
            return Err(ApiError::Forbidden);
        }

        let outcome = session
            .submit_guess(digit, &self.source, &self.store, &self.rngs)
            .map_err(map_session_error)?;

        let response = SubmitAnswerResponse {
            correct: matches!(outcome, GuessOutcome::Correct { .. }),
            completed: matches!(outcome, GuessOutcome::Correct { completed: true, .. }),
            score: session.display_score(),
            attempts: session.attempts_remaining(),
        };
        if session.is_terminated() {
            self.owners.remove(user);
        }
        Ok(response)
    }

    /// Present a scheduled countdown tick for a game. Unknown games and stale
    /// tokens are ignored.
    pub fn tick_game(&mut self, game_id: GameId, token: TickToken) -> TickOutcome {
        let Some(session) = self.sessions.get_mut(&game_id) else {
            return TickOutcome::Ignored;
        };
        let outcome = session.tick(token, &self.store);
        if session.is_terminated()
            && let Some(user) = session.user_id().cloned()
        {
            self.owners.remove(&user);
        }
        outcome
    }

    /// Explicitly terminate a game (navigation away, logout). Idempotent.
    ///
    /// # Errors
    ///
    /// 400 on a malformed id, 403 for a non-owner, 404 when unknown.
    pub fn terminate_game(
        &mut self,
        user: Option<&UserId>,
        game_id: &str,
    ) -> Result<(), ApiError> {
        let Some(user) = user else {
            return Err(ApiError::Unauthenticated);
        };
        let id = parse_game_id(game_id)?;
        let Some(session) = self.sessions.get_mut(&id) else {
            return Err(ApiError::NotFound);
        };
        if session.user_id() != Some(user) {
            return Err(ApiError::Forbidden);
        }
        session.terminate(&self.store);
        self.owners.remove(user);
        Ok(())
    }

    /// `GET /scores`: every persisted score, best first.
    ///
    /// # Errors
    ///
    /// 500 when the store cannot serve the query.
    pub fn scores(&self) -> Result<Vec<ScoreboardEntry>, ApiError> {
        let rows = self
            .store
            .all_scores()
            .map_err(|err| ApiError::Internal(format!("failed to retrieve scores: {err}")))?;
        Ok(rows.into_iter().map(entry_from_row).collect())
    }

    /// `GET /scores/user`: the caller's scores, newest first.
    ///
    /// # Errors
    ///
    /// 401 without a user, 500 when the store cannot serve the query.
    pub fn user_scores(&self, user: Option<&UserId>) -> Result<Vec<ScoreboardEntry>, ApiError> {
        let Some(user) = user else {
            return Err(ApiError::Unauthenticated);
        };
        let rows = self
            .store
            .scores_for_user(user)
            .map_err(|err| ApiError::Internal(format!("failed to retrieve scores: {err}")))?;
        Ok(rows.into_iter().map(entry_from_row).collect())
    }

    /// `POST /scores`: manual score submission from the client.
    ///
    /// # Errors
    ///
    /// 400 on missing ids, an unknown level, or an out-of-range score; 500
    /// when persistence fails.
    pub fn submit_score(&mut self, request: &SubmitScoreRequest) -> Result<(), ApiError> {
        if request.user_id.trim().is_empty() {
            return Err(ApiError::Validation("invalid user ID".to_string()));
        }
        let game_id = parse_game_id(&request.game_id)?;
        let level: Level = request
            .level
            .parse()
            .map_err(|err: crate::level::UnknownLevel| ApiError::Validation(err.to_string()))?;
        if request.score > MAX_RANKED_SCORE {
            return Err(ApiError::Validation(format!(
                "score must be at most {MAX_RANKED_SCORE}"
            )));
        }
        let record = ScoreRecord {
            user_id: UserId(request.user_id.clone()),
            game_id,
            level,
            score: request.score,
            attempts: 1,
            completed: true,
        };
        self.store
            .record(&record)
            .map_err(|err| ApiError::Internal(format!("failed to submit score: {err}")))
    }

    /// Read access to a live session, e.g. for the host's timer loop.
    #[must_use]
    pub fn session(&self, game_id: GameId) -> Option<&GameSession> {
        self.sessions.get(&game_id)
    }

    /// The game a user currently has running, if any.
    #[must_use]
    pub fn active_game(&self, user: &UserId) -> Option<GameId> {
        self.owners.get(user).copied()
    }

    fn mint_game_id(&mut self) -> GameId {
        loop {
            let id = GameId::mint(&self.rngs);
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }
}

fn parse_game_id(raw: &str) -> Result<GameId, ApiError> {
    u64::from_str_radix(raw.trim(), 16)
        .map(GameId)
        .map_err(|_| ApiError::Validation("invalid game ID format".to_string()))
}

fn map_session_error(err: SessionError) -> ApiError {
    match err {
        SessionError::DigitOutOfRange(_) | SessionError::Terminated | SessionError::NotActive => {
            ApiError::Validation(err.to_string())
        }
        SessionError::Upstream(msg) => ApiError::Internal(msg),
    }
}

fn entry_from_row(row: crate::recorder::ScoreRow) -> ScoreboardEntry {
    ScoreboardEntry {
        name: row.name.unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
        level: row.level,
        score: row.score,
        attempts: row.attempts,
        date: row.date,
    }
}
