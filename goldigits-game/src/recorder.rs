//! Score persistence: the record written at termination and the in-memory
//! store used by tests and the tester harness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use crate::level::Level;
use crate::session::{GameId, UserId};
use crate::{ScoreRecorder, ScoreStore};

/// Final aggregate persisted at most once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub user_id: UserId,
    pub game_id: GameId,
    pub level: Level,
    /// Ranked score, 0..=100.
    pub score: u32,
    /// Total guesses across the session, at least 1.
    pub attempts: u32,
    /// Whether the session cleared its required correct count.
    pub completed: bool,
}

/// Leaderboard view row served back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub name: Option<String>,
    pub level: Level,
    pub score: u32,
    pub attempts: u32,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredScore {
    record: ScoreRecord,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    rows: Vec<StoredScore>,
    names: HashMap<UserId, String>,
    ready: bool,
}

/// In-memory score store. Shares its contents across clones, mirroring a
/// connection handle to an external database.
#[derive(Debug, Clone)]
pub struct MemoryScoreStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryScoreStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryInner {
                rows: Vec::new(),
                names: HashMap::new(),
                ready: true,
            })),
        }
    }

    /// Register a display name for a user id; unknown users render as
    /// anonymous in leaderboard views.
    pub fn register_user(&self, user: UserId, name: impl Into<String>) {
        self.inner.borrow_mut().names.insert(user, name.into());
    }

    /// Simulate storage (un)availability for session-start health checks.
    pub fn set_ready(&self, ready: bool) {
        self.inner.borrow_mut().ready = ready;
    }

    /// Number of persisted records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recently persisted record, if any.
    #[must_use]
    pub fn last_record(&self) -> Option<ScoreRecord> {
        self.inner
            .borrow()
            .rows
            .last()
            .map(|stored| stored.record.clone())
    }

    fn row_for(&self, stored: &StoredScore, names: &HashMap<UserId, String>) -> ScoreRow {
        ScoreRow {
            name: names.get(&stored.record.user_id).cloned(),
            level: stored.record.level,
            score: stored.record.score,
            attempts: stored.record.attempts,
            date: stored.created_at,
        }
    }
}

impl Default for MemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreRecorder for MemoryScoreStore {
    type Error = Infallible;

    fn record(&self, record: &ScoreRecord) -> Result<(), Self::Error> {
        self.inner.borrow_mut().rows.push(StoredScore {
            record: record.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }
}

impl ScoreStore for MemoryScoreStore {
    fn is_ready(&self) -> bool {
        self.inner.borrow().ready
    }

    fn all_scores(&self) -> Result<Vec<ScoreRow>, Self::Error> {
        let inner = self.inner.borrow();
        let mut rows: Vec<ScoreRow> = inner
            .rows
            .iter()
            .map(|stored| self.row_for(stored, &inner.names))
            .collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score).then(b.date.cmp(&a.date)));
        Ok(rows)
    }

    fn scores_for_user(&self, user: &UserId) -> Result<Vec<ScoreRow>, Self::Error> {
        let inner = self.inner.borrow();
        let mut rows: Vec<ScoreRow> = inner
            .rows
            .iter()
            .filter(|stored| &stored.record.user_id == user)
            .map(|stored| self.row_for(stored, &inner.names))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, game: u64, score: u32) -> ScoreRecord {
        ScoreRecord {
            user_id: UserId(user.to_string()),
            game_id: GameId(game),
            level: Level::Easy,
            score,
            attempts: 1,
            completed: true,
        }
    }

    #[test]
    fn all_scores_sorts_by_score_then_recency() {
        let store = MemoryScoreStore::new();
        store.record(&record("a", 1, 60)).unwrap();
        store.record(&record("b", 2, 95)).unwrap();
        store.record(&record("c", 3, 95)).unwrap();

        let rows = store.all_scores().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].score, 95);
        assert_eq!(rows[1].score, 95);
        assert_eq!(rows[2].score, 60);
        // Equal scores: the later write wins the tie.
        assert!(rows[0].date >= rows[1].date);
    }

    #[test]
    fn user_scores_filter_and_sort_by_recency() {
        let store = MemoryScoreStore::new();
        let alice = UserId("alice".to_string());
        store.record(&record("alice", 1, 40)).unwrap();
        store.record(&record("bob", 2, 90)).unwrap();
        store.record(&record("alice", 3, 70)).unwrap();

        let rows = store.scores_for_user(&alice).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].score, 70);
        assert_eq!(rows[1].score, 40);
    }

    #[test]
    fn names_resolve_only_when_registered() {
        let store = MemoryScoreStore::new();
        store.register_user(UserId("alice".to_string()), "Alice");
        store.record(&record("alice", 1, 80)).unwrap();
        store.record(&record("ghost", 2, 50)).unwrap();

        let rows = store.all_scores().unwrap();
        assert_eq!(rows[0].name.as_deref(), Some("Alice"));
        assert_eq!(rows[1].name, None);
    }

    #[test]
    fn clones_share_contents() {
        let store = MemoryScoreStore::new();
        let handle = store.clone();
        handle.record(&record("a", 1, 10)).unwrap();
        assert_eq!(store.len(), 1);
    }
}
