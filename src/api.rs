//! HTTP API and chat page

mod assets;
mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::gateway::CompletionGateway;
use crate::llm::{
    resolve_model, GeminiCatalog, GeminiService, LlmConfig, LoggingService, ModelInfo,
    ModelSelectionError,
};
use crate::runtime::SessionManager;
use std::sync::Arc;
use std::time::Duration;

/// Whether the chat can be offered at all
#[derive(Clone)]
pub enum ChatAvailability {
    Ready {
        sessions: Arc<SessionManager>,
        /// Generation-capable models found at startup
        models: Arc<Vec<ModelInfo>>,
    },
    /// Blocking error: no chat surface is served
    Unavailable { reason: Arc<str> },
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: ChatAvailability,
}

impl AppState {
    pub fn ready(sessions: Arc<SessionManager>, models: Vec<ModelInfo>) -> Self {
        Self {
            chat: ChatAvailability::Ready {
                sessions,
                models: Arc::new(models),
            },
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason: String = reason.into();
        Self {
            chat: ChatAvailability::Unavailable {
                reason: Arc::from(reason),
            },
        }
    }

    /// Enumerate models, select the configured one and wire up the gateway.
    ///
    /// Any failure leaves the service in the blocking-error state.
    pub async fn connect(config: &LlmConfig, session_idle_ttl: Duration) -> Self {
        match Self::try_connect(config, session_idle_ttl).await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, model = %config.model, "Chat unavailable");
                Self::unavailable(e.to_string())
            }
        }
    }

    async fn try_connect(
        config: &LlmConfig,
        session_idle_ttl: Duration,
    ) -> Result<Self, ModelSelectionError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or(ModelSelectionError::MissingApiKey)?;

        let catalog = GeminiCatalog::new(config, api_key)?;
        let (model, models) = resolve_model(&catalog, &config.model).await?;

        let service = GeminiService::new(config, api_key, &model.name)?;
        let llm = Arc::new(LoggingService::new(Arc::new(service)));
        let gateway = CompletionGateway::new(llm).with_max_tokens(config.max_output_tokens);
        let sessions = Arc::new(SessionManager::new(gateway).with_idle_ttl(session_idle_ttl));

        tracing::info!(
            model = %model.name,
            available = models.len(),
            "Model selected"
        );
        Ok(Self::ready(sessions, models))
    }
}
