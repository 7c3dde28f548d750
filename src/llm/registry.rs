//! Model configuration and selection
//!
//! The chat uses one explicitly named model. At startup the provider's catalog
//! is enumerated and the configured name must appear among the models that
//! support `generateContent`; otherwise the chat is unavailable.

use super::{LlmError, ModelCatalog, ModelInfo, GENERATE_CONTENT};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the LLM provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Model to chat with, with or without the `models/` prefix
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Cap on generated tokens; provider default when unset
    pub max_output_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_output_tokens: None,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            api_key: non_empty("GOOGLE_API_KEY"),
            model: non_empty("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: non_empty("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            timeout: non_empty("GEMINI_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|&secs| secs > 0)
                .map_or(defaults.timeout, Duration::from_secs),
            max_output_tokens: non_empty("GEMINI_MAX_OUTPUT_TOKENS")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|&max| max > 0),
        }
    }
}

/// Why no model could be selected
#[derive(Debug, Error)]
pub enum ModelSelectionError {
    #[error("GOOGLE_API_KEY is not set")]
    MissingApiKey,

    #[error("Could not list models: {0}")]
    Catalog(#[from] LlmError),

    #[error("No available models found that support generateContent. Check your API key and region.")]
    NoGenerativeModels,

    #[error("Model '{requested}' is not available for generateContent (available: {})", .available.join(", "))]
    Unavailable {
        requested: String,
        available: Vec<String>,
    },
}

/// Keep only models usable for chat, preserving catalog order.
pub fn generative_models(models: Vec<ModelInfo>) -> Vec<ModelInfo> {
    models
        .into_iter()
        .filter(|m| m.supports(GENERATE_CONTENT))
        .collect()
}

/// Enumerate the catalog and find the configured model in it.
///
/// Returns the selected model together with every generation-capable model
/// so callers can report what was discovered.
pub async fn resolve_model(
    catalog: &dyn ModelCatalog,
    requested: &str,
) -> Result<(ModelInfo, Vec<ModelInfo>), ModelSelectionError> {
    let available = generative_models(catalog.list_models().await?);
    if available.is_empty() {
        return Err(ModelSelectionError::NoGenerativeModels);
    }

    let wanted = requested.strip_prefix("models/").unwrap_or(requested);
    match available.iter().find(|m| m.short_name() == wanted) {
        Some(model) => Ok((model.clone(), available)),
        None => Err(ModelSelectionError::Unavailable {
            requested: requested.to_string(),
            available: available.iter().map(|m| m.short_name().to_string()).collect(),
        }),
    }
}
