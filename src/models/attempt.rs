// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::PublicAnswer;

/// Represents the 'quiz_attempts' table: one instance of a user taking a
/// quiz. Created at quiz start, mutated exactly once at finish (score +
/// finished timestamp), immutable afterward.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub user_id: i64,
    pub quiz_type_id: i64,

    /// Percentage score 0-100, written at finish.
    pub score: i32,

    pub created: chrono::DateTime<chrono::Utc>,
    pub finished: Option<chrono::DateTime<chrono::Utc>>,

    /// Human-readable code, e.g. 'Test-2026-000042'. Unique, monotonic
    /// per year, never reused.
    pub code: String,
}

/// Row of the user's attempt history (joined with the quiz type name).
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptSummary {
    pub id: i64,
    pub code: String,
    pub quiz_type: String,
    pub score: i32,
    pub created: chrono::DateTime<chrono::Utc>,
    pub finished: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for starting a quiz.
#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
    pub quiz_type_id: i64,
    /// Requested number of questions; clamped to the active pool size.
    pub question_count: i64,
}

/// DTO for the save-answer JSON endpoint.
#[derive(Debug, Deserialize)]
pub struct SaveAnswerRequest {
    pub question_id: i64,
    pub answer_id: i64,
}

/// The single question shown on a quiz page.
#[derive(Debug, Serialize)]
pub struct QuizPageQuestion {
    pub id: i64,
    pub name: String,
    pub is_multiple_choice: bool,
    pub answers: Vec<PublicAnswer>,
}

/// Response for one paginated quiz page (page size is always 1).
#[derive(Debug, Serialize)]
pub struct QuizPageResponse {
    pub code: String,
    pub page: usize,
    pub total_pages: usize,
    pub question: QuizPageQuestion,
    /// 1-based ordinals of already-answered questions, for the progress bar.
    pub answered_questions: Vec<usize>,
}
