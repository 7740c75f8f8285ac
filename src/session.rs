// src/session.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Transient state for one user's quiz in progress.
///
/// Populated at quiz start and cleared at quiz finish. The sampled question
/// order lives here so every paginated view of the attempt sees the same
/// ordering; `attempt_questions` keeps a durable copy for recovery.
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub attempt_id: i64,
    /// Question ids in the exact order they were sampled.
    pub question_ids: Vec<i64>,
    pub started_at: DateTime<Utc>,
}

/// In-memory per-user session store, keyed by user id.
///
/// One entry per user: starting a new quiz replaces any previous session.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<i64, QuizSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, user_id: i64, session: QuizSession) {
        self.inner.write().await.insert(user_id, session);
    }

    pub async fn get(&self, user_id: i64) -> Option<QuizSession> {
        self.inner.read().await.get(&user_id).cloned()
    }

    /// Removes and returns the user's session, if any.
    pub async fn clear(&self, user_id: i64) -> Option<QuizSession> {
        self.inner.write().await.remove(&user_id)
    }
}
