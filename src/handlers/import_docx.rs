// src/handlers/import_docx.rs

use axum::{Json, extract::Multipart, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    handlers::question::refresh_multiple_choice,
    import::{self, docx, segment::segment_lines},
};

/// Imports questions from an uploaded Word document.
/// Admin only.
///
/// Multipart form: `quiz_type` (target quiz type id) + `file` (.docx bytes).
/// Blocks without answers are skipped and reported; every valid block is
/// committed even when some blocks had problems.
pub async fn upload_quiz_from_word(
    State(pool): State<PgPool>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut quiz_type_id: Option<i64> = None;
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("quiz_type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                quiz_type_id = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| AppError::BadRequest("Invalid quiz_type id".to_string()))?,
                );
            }
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file_bytes = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let quiz_type_id =
        quiz_type_id.ok_or(AppError::BadRequest("quiz_type field is required".to_string()))?;
    let file_bytes = file_bytes.ok_or(AppError::BadRequest("file field is required".to_string()))?;

    let quiz_type_name = sqlx::query_scalar::<_, String>(
        "SELECT name FROM quiz_types WHERE id = $1 AND is_active = TRUE",
    )
    .bind(quiz_type_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz type not found".to_string()))?;

    // Fatal pre-checks: nothing is written unless the document yields at
    // least one question block.
    let document = docx::read_document(&file_bytes)?;

    let lines = document.lines();
    if lines.is_empty() {
        return Err(AppError::BadRequest(
            "Fayl bo'sh, hech qanday matn topilmadi.".to_string(),
        ));
    }

    let blocks = segment_lines(&lines);
    if blocks.is_empty() {
        return Err(AppError::BadRequest(
            "Faylda savollar topilmadi.".to_string(),
        ));
    }

    let batch = import::build_batch(blocks);

    let mut tx = pool.begin().await?;
    let mut created = 0usize;

    for parsed in &batch.questions {
        let question_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO questions (quiz_type_id, name, is_active)
            VALUES ($1, $2, TRUE)
            RETURNING id
            "#,
        )
        .bind(quiz_type_id)
        .bind(&parsed.text)
        .fetch_one(&mut *tx)
        .await?;

        for answer in &parsed.answers {
            sqlx::query(
                r#"
                INSERT INTO answers (question_id, name, is_correct, is_active)
                VALUES ($1, $2, $3, TRUE)
                "#,
            )
            .bind(question_id)
            .bind(&answer.text)
            .bind(answer.is_correct)
            .execute(&mut *tx)
            .await?;
        }

        refresh_multiple_choice(&mut *tx, question_id).await?;
        created += 1;
    }

    tx.commit().await?;

    tracing::info!(
        quiz_type_id,
        created,
        problems = batch.problems.len(),
        "quiz import finished"
    );

    let message = import::import_summary(created, &quiz_type_name, &batch.problems);

    Ok(Json(serde_json::json!({
        "message": message,
        "created": created,
        "problems": batch.problems,
    })))
}
