// src/handlers/quiz.rs

use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Datelike, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppError,
    models::{
        attempt::{
            AttemptSummary, QuizAttempt, QuizPageQuestion, QuizPageResponse, SaveAnswerRequest,
            StartQuizRequest,
        },
        question::{Answer, Question},
    },
    session::{QuizSession, SessionStore},
    state::AppState,
    utils::jwt::Claims,
};

/// Builds the next attempt code for a year from the last assigned code.
///
/// Codes look like 'Test-2026-000042': zero-padded 6-digit sequence,
/// monotonic within a year, restarting at 000001 each year. An unparsable
/// last code restarts the sequence rather than failing the quiz start.
fn next_attempt_code(year: i32, last_code: Option<&str>) -> String {
    let last_num = last_code
        .and_then(|code| code.rsplit('-').next())
        .and_then(|seq| seq.parse::<u64>().ok())
        .unwrap_or(0);

    format!("Test-{}-{:06}", year, last_num + 1)
}

/// Percentage score, rounded to the nearest integer; 0 when nothing was
/// sampled.
///
/// Exact halves round away from zero (`f64::round`), so 1 of 8 scores 13.
fn compute_score(correct: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as i32
}

/// 1-based ordinals (within the sampled order) of answered questions.
fn answered_ordinals(ordered_ids: &[i64], answered: &HashSet<i64>) -> Vec<usize> {
    ordered_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| answered.contains(id))
        .map(|(i, _)| i + 1)
        .collect()
}

/// Starts a new quiz attempt.
///
/// Samples up to `question_count` distinct active questions of the quiz
/// type, creates the attempt row and its attempt_questions in one
/// transaction, and stores the sampled order in the user's session.
pub async fn start_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    if payload.question_count <= 0 {
        return Err(AppError::BadRequest(
            "question_count must be positive".to_string(),
        ));
    }

    let quiz_type_name = sqlx::query_scalar::<_, String>(
        "SELECT name FROM quiz_types WHERE id = $1 AND is_active = TRUE",
    )
    .bind(payload.quiz_type_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Quiz type not found".to_string()))?;

    // Uniform random sample without repeats; LIMIT clamps the requested
    // count to the available pool.
    let sampled_ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM questions
        WHERE quiz_type_id = $1 AND is_active = TRUE
        ORDER BY RANDOM()
        LIMIT $2
        "#,
    )
    .bind(payload.quiz_type_id)
    .bind(payload.question_count)
    .fetch_all(&state.pool)
    .await?;

    if sampled_ids.is_empty() {
        return Err(AppError::BadRequest(
            "No active questions for this quiz type".to_string(),
        ));
    }

    let started_at = Utc::now();
    let year = started_at.year();

    let mut tx = state.pool.begin().await?;

    let last_code = sqlx::query_scalar::<_, String>(
        r#"
        SELECT code FROM quiz_attempts
        WHERE code LIKE $1
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(format!("Test-{}-%", year))
    .fetch_optional(&mut *tx)
    .await?;

    let code = next_attempt_code(year, last_code.as_deref());

    let attempt_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quiz_attempts (user_id, quiz_type_id, code)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(payload.quiz_type_id)
    .bind(&code)
    .fetch_one(&mut *tx)
    .await?;

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO attempt_questions (attempt_id, question_id, position) ");
    builder.push_values(sampled_ids.iter().enumerate(), |mut b, (i, question_id)| {
        b.push_bind(attempt_id)
            .push_bind(question_id)
            .push_bind(i as i32);
    });
    builder.build().execute(&mut *tx).await?;

    tx.commit().await?;

    state
        .sessions
        .set(
            user_id,
            QuizSession {
                attempt_id,
                question_ids: sampled_ids.clone(),
                started_at,
            },
        )
        .await;

    tracing::info!(
        user_id,
        attempt_id,
        code = %code,
        questions = sampled_ids.len(),
        quiz_type = %quiz_type_name,
        "quiz attempt started"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "attempt_id": attempt_id,
            "code": code,
            "total_questions": sampled_ids.len(),
            "next": format!("/api/quiz/{}/page/1", attempt_id),
        })),
    ))
}

/// Loads the attempt and checks it belongs to the requesting user.
async fn load_owned_attempt(
    pool: &PgPool,
    attempt_id: i64,
    user_id: i64,
) -> Result<QuizAttempt, AppError> {
    let attempt = sqlx::query_as::<_, QuizAttempt>(
        r#"
        SELECT id, user_id, quiz_type_id, score, created, finished, code
        FROM quiz_attempts
        WHERE id = $1
        "#,
    )
    .bind(attempt_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if attempt.user_id != user_id {
        return Err(AppError::Forbidden(
            "Attempt belongs to another user".to_string(),
        ));
    }

    Ok(attempt)
}

/// Returns the attempt's sampled question ids in sampled order.
///
/// Prefers the live session; falls back to the durable attempt_questions
/// rows so pages keep working after a server restart.
async fn sampled_question_ids(
    pool: &PgPool,
    sessions: &SessionStore,
    user_id: i64,
    attempt_id: i64,
) -> Result<Vec<i64>, AppError> {
    if let Some(session) = sessions.get(user_id).await {
        if session.attempt_id == attempt_id {
            return Ok(session.question_ids);
        }
    }

    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT question_id FROM attempt_questions
        WHERE attempt_id = $1
        ORDER BY position
        "#,
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Renders one quiz page (page size 1) with progress information.
pub async fn quiz_page(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((attempt_id, page)): Path<(i64, usize)>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    let attempt = load_owned_attempt(&state.pool, attempt_id, user_id).await?;

    let sampled_ids =
        sampled_question_ids(&state.pool, &state.sessions, user_id, attempt_id).await?;

    // Pagination and progress both run over the sampled order, so the
    // ordinals here always agree with the ones save_answer reports.
    let total_pages = sampled_ids.len();
    if page == 0 || page > total_pages {
        return Err(AppError::NotFound("Page out of range".to_string()));
    }

    let question = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_type_id, name, is_active, is_multiple_choice
        FROM questions
        WHERE id = $1 AND is_active = TRUE
        "#,
    )
    .bind(sampled_ids[page - 1])
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound(
        "Question is no longer available".to_string(),
    ))?;

    let answered: HashSet<i64> = sqlx::query_scalar::<_, i64>(
        "SELECT question_id FROM user_answers WHERE user_id = $1 AND attempt_id = $2",
    )
    .bind(user_id)
    .bind(attempt_id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .collect();

    let answers = sqlx::query_as::<_, Answer>(
        r#"
        SELECT id, question_id, name, is_correct, is_active
        FROM answers
        WHERE question_id = $1 AND is_active = TRUE
        ORDER BY id
        "#,
    )
    .bind(question.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(QuizPageResponse {
        code: attempt.code,
        page,
        total_pages,
        question: QuizPageQuestion {
            id: question.id,
            name: question.name,
            is_multiple_choice: question.is_multiple_choice,
            answers: answers.into_iter().map(Into::into).collect(),
        },
        answered_questions: answered_ordinals(&sampled_ids, &answered),
    }))
}

/// Captures one answer for the active attempt.
///
/// Always responds with a JSON payload: `{"success": true,
/// "answered_questions": [...]}` or `{"success": false, "error": "..."}`.
/// Persistence failures never escape as a bare 500.
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SaveAnswerRequest>,
) -> Json<serde_json::Value> {
    match save_answer_inner(&state, &claims, payload).await {
        Ok(ordinals) => Json(serde_json::json!({
            "success": true,
            "answered_questions": ordinals,
        })),
        Err(err) => {
            tracing::warn!("save_answer failed: {}", err);
            Json(serde_json::json!({
                "success": false,
                "error": err.to_string(),
            }))
        }
    }
}

async fn save_answer_inner(
    state: &AppState,
    claims: &Claims,
    payload: SaveAnswerRequest,
) -> Result<Vec<usize>, AppError> {
    let user_id = claims.user_id();

    let session = state
        .sessions
        .get(user_id)
        .await
        .ok_or(AppError::BadRequest("No active quiz session".to_string()))?;

    let attempt = load_owned_attempt(&state.pool, session.attempt_id, user_id).await?;

    if attempt.finished.is_some() {
        return Err(AppError::BadRequest(
            "Attempt is already finished".to_string(),
        ));
    }

    if !session.question_ids.contains(&payload.question_id) {
        return Err(AppError::BadRequest(
            "Question is not part of this attempt".to_string(),
        ));
    }

    // The answer must exist and belong to the submitted question.
    let answer_ok = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM answers WHERE id = $1 AND question_id = $2",
    )
    .bind(payload.answer_id)
    .bind(payload.question_id)
    .fetch_optional(&state.pool)
    .await?;

    if answer_ok.is_none() {
        return Err(AppError::NotFound(
            "Answer not found for this question".to_string(),
        ));
    }

    // Conditional upsert keyed by (user, attempt, question): last write
    // wins without a delete/insert window.
    sqlx::query(
        r#"
        INSERT INTO user_answers (user_id, attempt_id, question_id, answer_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, attempt_id, question_id)
        DO UPDATE SET answer_id = EXCLUDED.answer_id
        "#,
    )
    .bind(user_id)
    .bind(session.attempt_id)
    .bind(payload.question_id)
    .bind(payload.answer_id)
    .execute(&state.pool)
    .await?;

    let answered: HashSet<i64> = sqlx::query_scalar::<_, i64>(
        "SELECT question_id FROM user_answers WHERE user_id = $1 AND attempt_id = $2",
    )
    .bind(user_id)
    .bind(session.attempt_id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .collect();

    Ok(answered_ordinals(&session.question_ids, &answered))
}

/// Finalizes the active attempt: scores it, stamps the finish time and
/// clears the session.
pub async fn finish_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let session = state
        .sessions
        .get(user_id)
        .await
        .ok_or(AppError::BadRequest("No active quiz session".to_string()))?;

    let attempt = load_owned_attempt(&state.pool, session.attempt_id, user_id).await?;

    if attempt.finished.is_some() {
        return Err(AppError::BadRequest(
            "Attempt is already finished".to_string(),
        ));
    }

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attempt_questions WHERE attempt_id = $1",
    )
    .bind(attempt.id)
    .fetch_one(&state.pool)
    .await? as usize;

    // Unanswered questions count toward the total but not toward correct.
    let rows = sqlx::query_as::<_, (i64, bool)>(
        r#"
        SELECT ua.question_id, a.is_correct
        FROM user_answers ua
        JOIN answers a ON a.id = ua.answer_id
        WHERE ua.user_id = $1 AND ua.attempt_id = $2
        "#,
    )
    .bind(user_id)
    .bind(attempt.id)
    .fetch_all(&state.pool)
    .await?;

    let answered = rows.len();
    let correct = rows.iter().filter(|(_, is_correct)| *is_correct).count();
    let score = compute_score(correct, total);

    sqlx::query("UPDATE quiz_attempts SET score = $1, finished = now() WHERE id = $2")
        .bind(score)
        .bind(attempt.id)
        .execute(&state.pool)
        .await?;

    state.sessions.clear(user_id).await;

    tracing::info!(
        user_id,
        attempt_id = attempt.id,
        code = %attempt.code,
        score,
        "quiz attempt finished"
    );

    Ok(Json(serde_json::json!({
        "code": attempt.code,
        "total_questions": total,
        "answered": answered,
        "correct": correct,
        "score": score,
    })))
}

/// Lists the requesting user's attempts, newest code first.
pub async fn my_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = sqlx::query_as::<_, AttemptSummary>(
        r#"
        SELECT a.id, a.code, t.name AS quiz_type, a.score, a.created, a.finished
        FROM quiz_attempts a
        JOIN quiz_types t ON t.id = a.quiz_type_id
        WHERE a.user_id = $1
        ORDER BY a.code DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(attempts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_code_of_the_year() {
        assert_eq!(next_attempt_code(2026, None), "Test-2026-000001");
    }

    #[test]
    fn code_increments_within_a_year() {
        assert_eq!(
            next_attempt_code(2026, Some("Test-2026-000001")),
            "Test-2026-000002"
        );
        assert_eq!(
            next_attempt_code(2026, Some("Test-2026-000999")),
            "Test-2026-001000"
        );
    }

    #[test]
    fn malformed_last_code_restarts_sequence() {
        assert_eq!(
            next_attempt_code(2026, Some("Test-2026-oops")),
            "Test-2026-000001"
        );
    }

    #[test]
    fn score_three_of_four_is_75() {
        assert_eq!(compute_score(3, 4), 75);
    }

    #[test]
    fn score_with_zero_total_is_zero() {
        assert_eq!(compute_score(0, 0), 0);
    }

    #[test]
    fn score_rounds_to_nearest() {
        assert_eq!(compute_score(1, 3), 33);
        assert_eq!(compute_score(2, 3), 67);
        assert_eq!(compute_score(5, 5), 100);
    }

    #[test]
    fn score_ties_round_away_from_zero() {
        assert_eq!(compute_score(1, 8), 13);
        assert_eq!(compute_score(3, 8), 38);
    }

    #[test]
    fn answered_ordinals_are_one_based_positions() {
        let answered: HashSet<i64> = [3, 2].into_iter().collect();
        assert_eq!(answered_ordinals(&[3, 1, 2], &answered), vec![1, 3]);
        assert_eq!(answered_ordinals(&[3, 1, 2], &HashSet::new()), Vec::<usize>::new());
    }
}
