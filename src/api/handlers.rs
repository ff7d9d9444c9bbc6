//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::types::{
    ChatRequest, ChatResponse, CreateSessionResponse, ErrorResponse, FlagRequest,
    InstructionRequest, TurnResponse, UploadRequest,
};
use super::AppState;
use crate::flagging::FlagRecord;
use crate::llm::CompletionRequest;
use crate::prompts::completion_failure_answer;
use crate::runtime::{Session, SessionSnapshot};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the single-page UI
        .route("/", get(serve_spa))
        // Static assets (embedded or filesystem fallback)
        .route("/assets/*path", get(serve_static))
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // Session turns
        .route("/api/sessions/:id/upload", post(upload_document))
        .route("/api/sessions/:id/chat", post(send_instruction))
        .route("/api/sessions/:id/render", post(render_diagram))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/sessions/:id/download", get(download_source))
        // Free-form chat with the completion endpoint
        .route("/api/chat", post(free_chat))
        // Manual flagging of chat answers
        .route("/api/flag", post(flag_exchange))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// SPA Handler
// ============================================================

async fn serve_spa() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let session = state.sessions.create().await;
    Json(CreateSessionResponse {
        session_id: session.id().to_string(),
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.snapshot()))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session not found: {id}")))
    }
}

// ============================================================
// Session Turns
// ============================================================

async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let session = find_session(&state, &id).await?;
    let bytes = STANDARD
        .decode(req.data.trim())
        .map_err(|e| AppError::BadRequest(format!("File data is not valid base64: {e}")))?;

    tracing::info!(session_id = %id, file_name = %req.file_name, bytes = bytes.len(), "Upload received");
    let outcome = session.upload(&req.file_name, &bytes).await;
    Ok(Json(outcome.into()))
}

async fn send_instruction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<InstructionRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let session = find_session(&state, &id).await?;
    let outcome = session.chat(&req.text).await;
    Ok(Json(outcome.into()))
}

async fn render_diagram(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TurnResponse>, AppError> {
    let session = find_session(&state, &id).await?;
    let outcome = session.render().await;
    Ok(Json(outcome.into()))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TurnResponse>, AppError> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.reset().into()))
}

async fn download_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let session = find_session(&state, &id).await?;
    let source = session.snapshot().source;
    if source.is_empty() {
        return Err(AppError::NotFound("No diagram to download yet".to_string()));
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"diagram.puml\"",
            ),
        ],
        source.to_string(),
    )
        .into_response())
}

// ============================================================
// Free Chat
// ============================================================

async fn free_chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Json<ChatResponse> {
    let request = CompletionRequest::new(req.message).with_history(req.history);
    let answer = match state.sessions.completion().complete(&request).await {
        Ok(answer) => answer,
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind.as_str(), "Free chat completion failed");
            completion_failure_answer(&e.message)
        }
    };
    Json(ChatResponse { answer })
}

async fn flag_exchange(
    State(state): State<AppState>,
    Json(req): Json<FlagRequest>,
) -> Result<StatusCode, AppError> {
    let record = FlagRecord {
        at: chrono::Utc::now(),
        label: req.label,
        message: req.message,
        answer: req.answer,
        session_id: req.session_id,
    };
    state
        .flags
        .record(&record)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_version() -> &'static str {
    concat!("diagram-chat ", env!("CARGO_PKG_VERSION"))
}

async fn find_session(state: &AppState, id: &str) -> Result<Arc<Session>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
