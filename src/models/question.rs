// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_type_id: i64,

    /// The question text.
    pub name: String,

    pub is_active: bool,

    /// Derived flag: TRUE iff more than one of the question's answers is
    /// marked correct. Kept in sync transactionally on every answer write.
    pub is_multiple_choice: bool,
}

/// Represents the 'answers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub name: String,
    pub is_correct: bool,
    pub is_active: bool,
}

/// DTO for sending an answer option to a quiz taker (hides `is_correct`).
#[derive(Debug, Serialize)]
pub struct PublicAnswer {
    pub id: i64,
    pub name: String,
}

impl From<Answer> for PublicAnswer {
    fn from(a: Answer) -> Self {
        PublicAnswer {
            id: a.id,
            name: a.name,
        }
    }
}

/// A question together with its answer options, as listed in the admin views.
#[derive(Debug, Serialize)]
pub struct QuestionWithAnswers {
    #[serde(flatten)]
    pub question: Question,
    pub answers: Vec<Answer>,
}

/// One answer option within a create/update question request.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AnswerInput {
    #[validate(length(min = 1, max = 1000))]
    pub name: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// DTO for creating a question with its inline batch of answers.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub quiz_type_id: i64,
    #[validate(length(min = 1, max = 1000))]
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[validate(nested, length(min = 1, message = "At least one answer is required."))]
    pub answers: Vec<AnswerInput>,
}

/// DTO for updating a question. Fields are optional; when `answers` is
/// present the full answer set is replaced.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub quiz_type_id: Option<i64>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub answers: Option<Vec<AnswerInput>>,
}

fn default_true() -> bool {
    true
}
