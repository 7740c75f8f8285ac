// src/models/quiz_type.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quiz_types' table: a named grouping of questions.
/// Deletion is a soft-deactivate; listings only show active rows.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizType {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
}

/// DTO for creating a quiz type.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizTypeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// DTO for updating a quiz type. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuizTypeRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}
