//! API request and response types

use crate::conversation::Turn;
use crate::llm::ModelInfo;
use crate::markdown::render_markdown;
use crate::runtime::{Exchange, SessionSummary};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// A turn as sent to the browser: stored text plus its rendered HTML
#[derive(Debug, Serialize)]
pub struct TurnView {
    #[serde(flatten)]
    pub turn: Turn,
    pub html: String,
}

impl From<Turn> for TurnView {
    fn from(turn: Turn) -> Self {
        let html = render_markdown(&turn.content);
        Self { turn, html }
    }
}

pub fn turn_views(turns: Vec<Turn>) -> Vec<TurnView> {
    turns.into_iter().map(TurnView::from).collect()
}

/// A session and its visible scrollback
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub turns: Vec<TurnView>,
}

/// Result of one chat submission
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub user: TurnView,
    pub reply: TurnView,
    pub turns: Vec<TurnView>,
}

impl From<Exchange> for ChatResponse {
    fn from(exchange: Exchange) -> Self {
        Self {
            user: exchange.user.into(),
            reply: exchange.reply.into(),
            turns: turn_views(exchange.turns),
        }
    }
}

/// Response with all live sessions
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

/// Readiness of the chat
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for model list
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub selected: String,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
