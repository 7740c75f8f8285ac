// src/handlers/quiz_type.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz_type::{CreateQuizTypeRequest, QuizType, UpdateQuizTypeRequest},
};

/// Lists active quiz types, newest first.
pub async fn list_quiz_types(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let quiz_types = sqlx::query_as::<_, QuizType>(
        r#"
        SELECT id, name, is_active
        FROM quiz_types
        WHERE is_active = TRUE
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(quiz_types))
}

/// Creates a new quiz type.
/// Admin only.
pub async fn create_quiz_type(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuizTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz_type = sqlx::query_as::<_, QuizType>(
        r#"
        INSERT INTO quiz_types (name, is_active)
        VALUES ($1, $2)
        RETURNING id, name, is_active
        "#,
    )
    .bind(&payload.name)
    .bind(payload.is_active)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz type: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(quiz_type)))
}

/// Updates a quiz type by ID.
/// Admin only.
pub async fn update_quiz_type(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.is_none() && payload.is_active.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quiz_types SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update quiz type: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz type not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deactivates a quiz type by ID (soft delete; attempts keep referencing it).
/// Admin only.
pub async fn delete_quiz_type(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE quiz_types SET is_active = FALSE WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to deactivate quiz type: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz type not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
