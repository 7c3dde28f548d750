//! Google Gemini provider implementation

use super::types::{LlmRequest, LlmResponse, ModelInfo, Usage};
use super::{LlmConfig, LlmError, LlmService, ModelCatalog};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const API_VERSION: &str = "v1beta";
const PAGE_SIZE: u32 = 1000;
const MAX_PAGES: usize = 50;

/// Shared HTTP plumbing for the Gemini REST API
#[derive(Clone)]
struct GeminiHttp {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiHttp {
    fn new(config: &LlmConfig, api_key: &str) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: format!("{}/{API_VERSION}", config.base_url.trim_end_matches('/')),
        })
    }

    /// Send a request and decode a JSON body, classifying failures.
    ///
    /// The key travels in a header so it never shows up in a URL, and
    /// therefore never in a reqwest error string.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, LlmError> {
        let response = request
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map_or(body, |resp| resp.error.message);
            return Err(LlmError::from_status(status, &message));
        }

        serde_json::from_str(&body)
            .map_err(|e| LlmError::malformed(format!("Failed to parse response: {e}")))
    }
}

/// Gemini generation service bound to one model
pub struct GeminiService {
    http: GeminiHttp,
    /// Fully qualified model name (`models/...`)
    model_name: String,
    model_id: String,
}

impl GeminiService {
    pub fn new(config: &LlmConfig, api_key: &str, model_name: &str) -> Result<Self, LlmError> {
        let short = model_name.strip_prefix("models/").unwrap_or(model_name);
        Ok(Self {
            http: GeminiHttp::new(config, api_key)?,
            model_name: format!("models/{short}"),
            model_id: short.to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/{}:generateContent", self.http.base_url, self.model_name)
    }

    pub(super) fn translate_request(request: &LlmRequest) -> GeminiRequest {
        let system_instruction = request.system.as_ref().map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart::text(text.clone())],
        });

        let contents = request
            .messages
            .iter()
            .map(|msg| GeminiContent {
                role: Some(msg.role.as_str().to_string()),
                parts: vec![GeminiPart::text(msg.text.clone())],
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: request.max_tokens.map(|max| GeminiGenerationConfig {
                max_output_tokens: Some(max),
            }),
        }
    }

    pub(super) fn normalize_response(resp: GeminiResponse) -> Result<LlmResponse, LlmError> {
        let Some(candidate) = resp.candidates.into_iter().next() else {
            let reason = resp
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "none given".to_string());
            return Err(LlmError::malformed(format!(
                "No candidates in response (block reason: {reason})"
            )));
        };

        // A candidate stopped by a safety filter carries no content at all
        let parts = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.thought.unwrap_or(false))
            .filter_map(|p| p.text)
            .collect();

        let usage = resp.usage_metadata.unwrap_or_default();

        Ok(LlmResponse {
            parts,
            finish_reason: candidate.finish_reason,
            usage: Usage {
                input_tokens: u64::from(usage.prompt_token_count),
                output_tokens: u64::from(usage.candidates_token_count),
            },
        })
    }
}

#[async_trait]
impl LlmService for GeminiService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = Self::translate_request(request);
        let response: GeminiResponse = self
            .http
            .send(self.http.client.post(self.generate_url()).json(&body))
            .await?;
        Self::normalize_response(response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Model enumeration against the Gemini `models` endpoint
pub struct GeminiCatalog {
    http: GeminiHttp,
}

impl GeminiCatalog {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self, LlmError> {
        Ok(Self {
            http: GeminiHttp::new(config, api_key)?,
        })
    }
}

#[async_trait]
impl ModelCatalog for GeminiCatalog {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let url = format!("{}/models", self.http.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        for _ in 0..MAX_PAGES {
            let mut request = self
                .http
                .client
                .get(&url)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: GeminiModelList = self.http.send(request).await?;
            models.extend(page.models.into_iter().map(|m| ModelInfo {
                display_name: m.display_name.unwrap_or_else(|| m.name.clone()),
                name: m.name,
                supported_generation_methods: m.supported_generation_methods,
            }));

            match page.next_page_token {
                Some(token) if !token.is_empty() => {
                    if !seen_tokens.insert(token.clone()) {
                        tracing::warn!(page_token = %token, "Model list repeated a page token, stopping");
                        break;
                    }
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        tracing::debug!(count = models.len(), "Enumerated Gemini models");
        Ok(models)
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

impl GeminiPart {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            thought: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
