//! HTTP request handlers

use super::assets::{blocking_error_html, get_index_html, serve_static};
use super::types::{
    turn_views, ChatRequest, ChatResponse, ErrorResponse, ModelsResponse, SessionListResponse,
    SessionResponse, StatusResponse, SuccessResponse,
};
use super::{AppState, ChatAvailability};
use crate::runtime::{SessionManager, SubmitError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat page, or the blocking error
        .route("/", get(serve_index))
        .route("/assets/*path", get(serve_static))
        .route("/api/status", get(get_status))
        .route("/api/models", get(list_models))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route(
            "/api/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/version", get(get_version))
        .with_state(state)
}

impl AppState {
    fn sessions(&self) -> Result<&Arc<SessionManager>, AppError> {
        match &self.chat {
            ChatAvailability::Ready { sessions, .. } => Ok(sessions),
            ChatAvailability::Unavailable { reason } => {
                Err(AppError::Unavailable(reason.to_string()))
            }
        }
    }
}

// ============================================================
// Page
// ============================================================

async fn serve_index(State(state): State<AppState>) -> Response {
    match &state.chat {
        ChatAvailability::Unavailable { reason } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(blocking_error_html(reason)),
        )
            .into_response(),
        ChatAvailability::Ready { .. } => match get_index_html() {
            Some(content) => Html(content).into_response(),
            None => (
                StatusCode::NOT_FOUND,
                Html("<h1>404 - chat page not found</h1>".to_string()),
            )
                .into_response(),
        },
    }
}

// ============================================================
// Status and models
// ============================================================

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(match &state.chat {
        ChatAvailability::Ready { sessions, .. } => StatusResponse {
            ready: true,
            model: Some(sessions.model_id().to_string()),
            error: None,
        },
        ChatAvailability::Unavailable { reason } => StatusResponse {
            ready: false,
            model: None,
            error: Some(reason.to_string()),
        },
    })
}

async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, AppError> {
    match &state.chat {
        ChatAvailability::Ready { sessions, models } => Ok(Json(ModelsResponse {
            models: models.as_ref().clone(),
            selected: sessions.model_id().to_string(),
        })),
        ChatAvailability::Unavailable { reason } => Err(AppError::Unavailable(reason.to_string())),
    }
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = state.sessions()?.create_session().await;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            id: session.id.clone(),
            turns: Vec::new(),
        }),
    ))
}

async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state.sessions()?.list_sessions().await;
    Ok(Json(SessionListResponse { sessions }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let turns = state.sessions()?.visible_turns(&id).await?;
    Ok(Json(SessionResponse {
        id,
        turns: turn_views(turns),
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions()?.delete_session(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Chat
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let exchange = state.sessions()?.submit(&id, &req.text).await?;
    Ok(Json(exchange.into()))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("unit-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
}

impl From<SubmitError> for AppError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::EmptyInput => AppError::BadRequest(e.to_string()),
            SubmitError::UnknownSession(_) => AppError::NotFound(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
