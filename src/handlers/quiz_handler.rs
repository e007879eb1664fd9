use actix_web::{get, http::header, post, web, HttpRequest, HttpResponse};
use chrono::Duration;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::request::NextQuestionsRequest,
    models::dto::response::{HealthResponse, StartQuizSessionResponse},
    services::chunking_service,
};

const DEFAULT_NUM_QUESTIONS: usize = 5;

/// Upload entry: binary payload plus a declared MIME type in Content-Type.
/// Runs the full pipeline: extract, chunk, persist, generate.
#[post("/start-quiz-session")]
pub async fn start_quiz_session(
    state: web::Data<AppState>,
    request: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    // Session cleanup is maintenance; a failure is logged but never blocks
    // the upload.
    let ttl = Duration::hours(state.config.session_ttl_hours);
    if let Err(err) = state.quiz_service.purge_expired(ttl).await {
        log::warn!("session purge failed: {}", err);
    }

    let mime_type = declared_mime_type(&request);
    let session_id = Uuid::new_v4().to_string();

    let text = state.extraction_service.extract(&body, &mime_type).await?;
    if text.trim().is_empty() {
        return Err(AppError::NoExtractableText);
    }

    let text_chunks = chunking_service::chunk(&text);
    if text_chunks.is_empty() {
        return Err(AppError::EmptyChunkSet);
    }

    let quiz = state
        .quiz_service
        .generate_initial(&session_id, &text_chunks, DEFAULT_NUM_QUESTIONS)
        .await?;

    Ok(HttpResponse::Ok().json(StartQuizSessionResponse { session_id, quiz }))
}

/// Follow-up entry: a new batch for an existing session, excluding the
/// questions the caller has already seen.
#[post("/quiz-session/{session_id}/next-questions")]
pub async fn next_questions(
    state: web::Data<AppState>,
    session_id: web::Path<String>,
    request: web::Json<NextQuestionsRequest>,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .generate_more(&session_id, &request.asked_questions, DEFAULT_NUM_QUESTIONS)
        .await?;

    Ok(HttpResponse::Ok().json(quiz))
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

/// The declared MIME type, without parameters such as charset.
fn declared_mime_type(request: &HttpRequest) -> String {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .unwrap_or("")
        .trim()
        .to_string()
}
