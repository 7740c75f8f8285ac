// tests/api_tests.rs
//
// Integration tests against a running Postgres instance. They are ignored
// by default; set DATABASE_URL and run `cargo test -- --ignored`.

use quizhub::{config::Config, routes, session::SessionStore, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345") and the pool.
async fn spawn_app() -> (String, PgPool) {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        sessions: SessionStore::new(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// Registers a user, promotes it to the given role and returns a token.
async fn register_and_login(address: &str, pool: &PgPool, role: &str) -> String {
    let client = reqwest::Client::new();
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"username": username, "password": password}))
        .send()
        .await
        .expect("Register failed");

    if role != "user" {
        sqlx::query("UPDATE users SET role = $1 WHERE username = $2")
            .bind(role)
            .bind(&username)
            .execute(pool)
            .await
            .unwrap();
    }

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"username": username, "password": password}))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

/// Seeds a quiz type with `n` questions (one correct + one wrong answer
/// each) and returns the quiz type id.
async fn seed_quiz_type(pool: &PgPool, n: i64) -> i64 {
    let quiz_type_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO quiz_types (name) VALUES ($1) RETURNING id",
    )
    .bind(format!("type_{}", &uuid::Uuid::new_v4().to_string()[..8]))
    .fetch_one(pool)
    .await
    .unwrap();

    for i in 0..n {
        let question_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO questions (quiz_type_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(quiz_type_id)
        .bind(format!("Question {}", i))
        .fetch_one(pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO answers (question_id, name, is_correct) VALUES ($1, 'right', TRUE), ($1, 'wrong', FALSE)",
        )
        .bind(question_id)
        .execute(pool)
        .await
        .unwrap();
    }

    quiz_type_id
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn health_check_404() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn register_works_and_validation_rejects_short_names() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let unique_name = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"username": unique_name, "password": "password123"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"username": "yo", "password": "password123"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn quiz_type_writes_require_admin() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let user_token = register_and_login(&address, &pool, "user").await;

    let response = client
        .post(format!("{}/api/quiztypes", address))
        .header("Authorization", format!("Bearer {}", user_token))
        .json(&serde_json::json!({"name": "Forbidden"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let admin_token = register_and_login(&address, &pool, "admin").await;
    let response = client
        .post(format!("{}/api/quiztypes", address))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&serde_json::json!({"name": "Allowed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn full_quiz_flow() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz_type_id = seed_quiz_type(&pool, 3).await;
    let token = register_and_login(&address, &pool, "user").await;

    // Requested count larger than the pool clamps to 3.
    let start: serde_json::Value = client
        .post(format!("{}/api/quiz/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"quiz_type_id": quiz_type_id, "question_count": 10}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let attempt_id = start["attempt_id"].as_i64().expect("attempt_id missing");
    assert_eq!(start["total_questions"], 3);
    assert!(start["code"].as_str().unwrap().starts_with("Test-"));

    // Page 1 shows a single question with hidden correctness.
    let page: serde_json::Value = client
        .get(format!("{}/api/quiz/{}/page/1", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(page["page"], 1);
    assert_eq!(page["total_pages"], 3);
    assert_eq!(page["answered_questions"].as_array().unwrap().len(), 0);
    let question_id = page["question"]["id"].as_i64().unwrap();
    let answers = page["question"]["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 2);
    assert!(answers[0].get("is_correct").is_none());

    // Submit both options for the same question; last write wins and the
    // question stays answered exactly once.
    for answer in answers {
        let saved: serde_json::Value = client
            .post(format!("{}/api/quiz/save-answer", address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({
                "question_id": question_id,
                "answer_id": answer["id"],
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(saved["success"], true);
        assert_eq!(saved["answered_questions"].as_array().unwrap().len(), 1);
    }

    let row_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM user_answers WHERE attempt_id = $1 AND question_id = $2",
    )
    .bind(attempt_id)
    .bind(question_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row_count, 1);

    // Finish: one answered question out of three, the stored row is the
    // last submitted (the wrong one), so the score is 0.
    let finish: serde_json::Value = client
        .post(format!("{}/api/quiz/finish", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(finish["total_questions"], 3);
    assert_eq!(finish["answered"], 1);
    assert_eq!(finish["correct"], 0);
    assert_eq!(finish["score"], 0);

    // The session is cleared; saving again reports a recoverable error.
    let saved: serde_json::Value = client
        .post(format!("{}/api/quiz/save-answer", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"question_id": question_id, "answer_id": 1}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["success"], false);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn deactivating_a_question_mid_attempt_keeps_ordinals_stable() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz_type_id = seed_quiz_type(&pool, 3).await;
    let token = register_and_login(&address, &pool, "user").await;

    let start: serde_json::Value = client
        .post(format!("{}/api/quiz/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"quiz_type_id": quiz_type_id, "question_count": 3}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attempt_id = start["attempt_id"].as_i64().unwrap();

    // Answer the question on page 2.
    let page2: serde_json::Value = client
        .get(format!("{}/api/quiz/{}/page/2", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let page2_question = page2["question"]["id"].as_i64().unwrap();
    let page2_answer = page2["question"]["answers"][0]["id"].clone();

    let saved: serde_json::Value = client
        .post(format!("{}/api/quiz/save-answer", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "question_id": page2_question,
            "answer_id": page2_answer,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["answered_questions"], serde_json::json!([2]));

    // Deactivate the question on page 1 mid-attempt.
    let page1: serde_json::Value = client
        .get(format!("{}/api/quiz/{}/page/1", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let page1_question = page1["question"]["id"].as_i64().unwrap();

    sqlx::query("UPDATE questions SET is_active = FALSE WHERE id = $1")
        .bind(page1_question)
        .execute(&pool)
        .await
        .unwrap();

    // Page 2 keeps its ordinal and the total page count; both stay on the
    // sampled order, matching what save-answer reports.
    let page2_after: serde_json::Value = client
        .get(format!("{}/api/quiz/{}/page/2", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page2_after["total_pages"], 3);
    assert_eq!(page2_after["answered_questions"], serde_json::json!([2]));
    assert_eq!(page2_after["question"]["id"].as_i64().unwrap(), page2_question);

    // The deactivated question's own page is gone.
    let response = client
        .get(format!("{}/api/quiz/{}/page/1", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn docx_import_creates_questions_and_reports_problems() {
    use docx_rs::{Docx, Paragraph, Run};
    use std::io::Cursor;

    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let admin_token = register_and_login(&address, &pool, "admin").await;
    let quiz_type_id = seed_quiz_type(&pool, 0).await;

    let mut docx = Docx::new();
    for line in [
        "1. Capital of Uzbekistan?",
        "*Tashkent",
        "Samarkand",
        "2. Question without answers",
        "3. Two plus two?",
        "*4",
        "5",
    ] {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
    }
    let mut buf = Cursor::new(Vec::new());
    docx.build().pack(&mut buf).unwrap();

    let form = reqwest::multipart::Form::new()
        .text("quiz_type", quiz_type_id.to_string())
        .part(
            "file",
            reqwest::multipart::Part::bytes(buf.into_inner()).file_name("quiz.docx"),
        );

    let response: serde_json::Value = client
        .post(format!("{}/api/admin/upload-quiz", address))
        .header("Authorization", format!("Bearer {}", admin_token))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response["created"], 2);
    let problems = response["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 1);
    assert_eq!(
        problems[0],
        "'2. Question without answers' uchun javob topilmadi"
    );

    let question_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM questions WHERE quiz_type_id = $1",
    )
    .bind(quiz_type_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(question_count, 2);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn multiple_choice_flag_tracks_correct_answer_count() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let admin_token = register_and_login(&address, &pool, "admin").await;
    let quiz_type_id = seed_quiz_type(&pool, 0).await;

    let created: serde_json::Value = client
        .post(format!("{}/api/questions", address))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&serde_json::json!({
            "quiz_type_id": quiz_type_id,
            "name": "Pick all primes",
            "answers": [
                {"name": "2", "is_correct": true},
                {"name": "4", "is_correct": false},
            ],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let question_id = created["id"].as_i64().unwrap();

    let flag = sqlx::query_scalar::<_, bool>(
        "SELECT is_multiple_choice FROM questions WHERE id = $1",
    )
    .bind(question_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(!flag);

    // A second correct answer flips the derived flag on.
    client
        .put(format!("{}/api/questions/{}", address, question_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&serde_json::json!({
            "answers": [
                {"name": "2", "is_correct": true},
                {"name": "3", "is_correct": true},
                {"name": "4", "is_correct": false},
            ],
        }))
        .send()
        .await
        .unwrap();

    let flag = sqlx::query_scalar::<_, bool>(
        "SELECT is_multiple_choice FROM questions WHERE id = $1",
    )
    .bind(question_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(flag);

    // Back to a single correct answer flips it off again.
    client
        .put(format!("{}/api/questions/{}", address, question_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&serde_json::json!({
            "answers": [{"name": "2", "is_correct": true}],
        }))
        .send()
        .await
        .unwrap();

    let flag = sqlx::query_scalar::<_, bool>(
        "SELECT is_multiple_choice FROM questions WHERE id = $1",
    )
    .bind(question_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(!flag);
}
