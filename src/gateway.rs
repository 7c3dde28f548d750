//! Completion gateway
//!
//! The single boundary between a conversation and the generation service.
//! Whatever happens upstream, a call produces exactly one model-role turn.

use crate::conversation::{Conversation, Turn};
use crate::llm::{LlmRequest, LlmService};
use crate::system_prompt::{CANONICAL_REFUSAL, ERROR_PREFIX, REFUSAL_PHRASE};
use std::sync::Arc;

/// Sends a conversation to the model and turns the outcome into a reply
#[derive(Clone)]
pub struct CompletionGateway {
    llm: Arc<dyn LlmService>,
    max_tokens: Option<u32>,
}

impl CompletionGateway {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self {
            llm,
            max_tokens: None,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Produce the model's reply to `conversation`.
    ///
    /// One attempt, no retries. Failures come back as error turns.
    pub async fn reply(&self, conversation: &Conversation) -> Turn {
        let request = build_request(conversation, self.max_tokens);

        match self.llm.complete(&request).await {
            Ok(response) => Turn::model(normalize_reply(&response.text())),
            Err(e) => {
                tracing::warn!(model = %self.model_id(), error = %e, "Generation failed, replying with error turn");
                Turn::error(format!("{ERROR_PREFIX}{e}"))
            }
        }
    }
}

/// Request for the whole conversation, with the seed in the system slot
pub fn build_request(conversation: &Conversation, max_tokens: Option<u32>) -> LlmRequest {
    LlmRequest {
        system: Some(conversation.system_instruction().to_string()),
        messages: conversation.context(),
        max_tokens,
    }
}

/// Replace blank answers and refusals with the canonical refusal sentence.
pub fn normalize_reply(text: &str) -> String {
    if text.trim().is_empty() || text.contains(REFUSAL_PHRASE) {
        tracing::debug!(original_len = text.len(), "Normalized reply to canonical refusal");
        CANONICAL_REFUSAL.to_string()
    } else {
        text.to_string()
    }
}
