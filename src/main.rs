//! Unit Conversion Chatbot
//!
//! A small web chat that forwards each session's conversation to a hosted
//! Gemini model, with a system instruction restricting it to unit conversions.

mod api;
mod conversation;
mod gateway;
mod llm;
mod markdown;
mod runtime;
mod system_prompt;

use api::{create_router, AppState};
use llm::LlmConfig;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unit_chat=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("UNIT_CHAT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let session_idle_ttl = std::env::var("UNIT_CHAT_SESSION_TTL_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .map_or(runtime::DEFAULT_SESSION_IDLE_TTL, Duration::from_secs);

    let llm_config = LlmConfig::from_env();
    tracing::info!(
        model = %llm_config.model,
        base_url = %llm_config.base_url,
        timeout_secs = llm_config.timeout.as_secs(),
        max_output_tokens = ?llm_config.max_output_tokens,
        api_key_set = llm_config.api_key.is_some(),
        "LLM configuration loaded"
    );

    // Model selection happens once; failure leaves the chat blocked
    let state = AppState::connect(&llm_config, session_idle_ttl).await;
    tracing::info!(
        session_idle_ttl_secs = session_idle_ttl.as_secs(),
        "Session expiry configured"
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Unit chat listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
