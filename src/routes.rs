// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, import_docx, question, quiz, quiz_type},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public routes: auth, quiz type / question listings.
/// * Authenticated routes: the quiz-taking flow.
/// * Admin routes: content management and the Word import.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let quiz_type_routes = Router::new()
        .route("/", get(quiz_type::list_quiz_types))
        .merge(
            Router::new()
                .route("/", post(quiz_type::create_quiz_type))
                .route(
                    "/{id}",
                    put(quiz_type::update_quiz_type).delete(quiz_type::delete_quiz_type),
                )
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let question_routes = Router::new()
        .route("/", get(question::list_questions))
        .merge(
            Router::new()
                .route("/", post(question::create_question))
                .route(
                    "/{id}",
                    put(question::update_question).delete(question::delete_question),
                )
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let quiz_routes = Router::new()
        .route("/start", post(quiz::start_quiz))
        .route("/{attempt_id}/page/{page}", get(quiz::quiz_page))
        .route("/save-answer", post(quiz::save_answer))
        .route("/finish", post(quiz::finish_quiz))
        .route("/attempts", get(quiz::my_attempts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/upload-quiz", post(import_docx::upload_quiz_from_word))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quiztypes", quiz_type_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
