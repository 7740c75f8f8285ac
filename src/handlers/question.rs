// src/handlers/question.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{
        Answer, AnswerInput, CreateQuestionRequest, Question, QuestionWithAnswers,
        UpdateQuestionRequest,
    },
};

/// Recomputes the derived `is_multiple_choice` flag of a question.
///
/// Must run inside the same transaction as the answer write that triggered
/// it, so a stale flag is never observable.
pub async fn refresh_multiple_choice(
    conn: &mut PgConnection,
    question_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE questions
        SET is_multiple_choice =
            (SELECT COUNT(*) FROM answers WHERE question_id = $1 AND is_correct = TRUE) > 1
        WHERE id = $1
        "#,
    )
    .bind(question_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts a batch of answers for a question. Caller owns the transaction
/// and the flag recomputation.
pub async fn insert_answers(
    conn: &mut PgConnection,
    question_id: i64,
    answers: &[AnswerInput],
) -> Result<(), sqlx::Error> {
    for answer in answers {
        sqlx::query(
            r#"
            INSERT INTO answers (question_id, name, is_correct, is_active)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(question_id)
        .bind(&answer.name)
        .bind(answer.is_correct)
        .bind(answer.is_active)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Query parameters for listing questions.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub quiz_type_id: Option<i64>,
}

/// Lists active questions with their answers, newest first, optionally
/// filtered by quiz type.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_type_id, name, is_active, is_multiple_choice
        FROM questions
        WHERE is_active = TRUE
          AND ($1::BIGINT IS NULL OR quiz_type_id = $1)
        ORDER BY id DESC
        "#,
    )
    .bind(params.quiz_type_id)
    .fetch_all(&pool)
    .await?;

    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

    let answers = sqlx::query_as::<_, Answer>(
        r#"
        SELECT id, question_id, name, is_correct, is_active
        FROM answers
        WHERE question_id = ANY($1)
        ORDER BY question_id, id
        "#,
    )
    .bind(&ids)
    .fetch_all(&pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<Answer>> = HashMap::new();
    for answer in answers {
        grouped.entry(answer.question_id).or_default().push(answer);
    }

    let result: Vec<QuestionWithAnswers> = questions
        .into_iter()
        .map(|q| {
            let answers = grouped.remove(&q.id).unwrap_or_default();
            QuestionWithAnswers {
                question: q,
                answers,
            }
        })
        .collect();

    Ok(Json(result))
}

/// Creates a question together with its inline batch of answers.
/// Admin only. At least one answer must be marked correct.
pub async fn create_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !payload.answers.iter().any(|a| a.is_correct) {
        return Err(AppError::BadRequest(
            "Kamida bitta to'g'ri javob bo'lishi kerak!".to_string(),
        ));
    }

    let quiz_type_exists =
        sqlx::query_scalar::<_, i64>("SELECT id FROM quiz_types WHERE id = $1 AND is_active = TRUE")
            .bind(payload.quiz_type_id)
            .fetch_optional(&pool)
            .await?;

    if quiz_type_exists.is_none() {
        return Err(AppError::NotFound("Quiz type not found".to_string()));
    }

    let mut tx = pool.begin().await?;

    let question_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO questions (quiz_type_id, name, is_active)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(payload.quiz_type_id)
    .bind(&payload.name)
    .bind(payload.is_active)
    .fetch_one(&mut *tx)
    .await?;

    insert_answers(&mut *tx, question_id, &payload.answers).await?;
    refresh_multiple_choice(&mut *tx, question_id).await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": question_id}))))
}

/// Updates a question; when `answers` is present the whole answer set is
/// replaced and the multiple-choice flag recomputed.
/// Admin only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM questions WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;

    if exists.is_none() {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    let mut tx = pool.begin().await?;

    if let Some(quiz_type_id) = payload.quiz_type_id {
        sqlx::query("UPDATE questions SET quiz_type_id = $1 WHERE id = $2")
            .bind(quiz_type_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(name) = payload.name {
        sqlx::query("UPDATE questions SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(is_active) = payload.is_active {
        sqlx::query("UPDATE questions SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(answers) = payload.answers {
        sqlx::query("DELETE FROM answers WHERE question_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_answers(&mut *tx, id, &answers).await?;
        refresh_multiple_choice(&mut *tx, id).await?;
    }

    tx.commit().await?;

    Ok(StatusCode::OK)
}

/// Deactivates a question by ID (soft delete).
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE questions SET is_active = FALSE WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to deactivate question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
