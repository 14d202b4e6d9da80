//! Gateway HTTP server: skill webhook plus health probes.

use crate::agent::{Responder, ResponderSettings};
use crate::channels::{SkillRequest, SkillResponse};
use crate::config::{self, Config};
use crate::llm::OpenAiClient;
use crate::safety::DangerFilter;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the gateway. Read-only after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub responder: Arc<Responder>,
    /// Port reported by the health JSON.
    pub port: u16,
}

/// All routes. Separate from [`run_gateway`] so tests can drive it without a socket.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/healthz", get(healthz))
        .route("/chatbuddy", post(skill_webhook))
        .route("/webhook", post(skill_webhook))
        .with_state(state)
}

/// Build the responder from config: API key (required), OpenAI client, danger filter, persona.
pub fn build_responder(config: &Config) -> Result<Responder> {
    config::validate(config)?;
    let api_key = config::resolve_api_key(config).context(
        "no LLM API key configured (set OPENAI_API_KEY or llm.apiKey in the config file)",
    )?;
    let filter = DangerFilter::from_config(&config.safety)?;
    if !filter.is_enabled() {
        log::warn!("danger filter has no patterns; crisis override is disabled");
    }
    let client = OpenAiClient::new(Some(config::resolve_base_url(config)), api_key)
        .with_max_tokens(config.llm.max_tokens);
    log::info!(
        "llm backend: {} model {} (timeout {} ms)",
        client.base_url(),
        config.llm.model,
        config.llm.timeout_ms
    );
    Ok(Responder::new(
        Arc::new(client),
        filter,
        ResponderSettings::from_config(config),
    ))
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Fails before binding when the API key is missing or the config is invalid.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let responder = build_responder(&config)?;
    let port = config.gateway.port;
    let state = GatewayState {
        responder: Arc::new(responder),
        port,
    };
    let app = router(state);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /chatbuddy (and /webhook) — skill payload in, simpleText envelope out. Always 200.
async fn skill_webhook(State(state): State<GatewayState>, body: Bytes) -> Json<SkillResponse> {
    let request = SkillRequest::from_slice(&body);
    let user_id = request.user_id();
    let outcome = state
        .responder
        .respond(request.utterance(), user_id.as_deref())
        .await;
    log::info!(
        "webhook: user {} -> {} reply",
        user_id.as_deref().unwrap_or("-"),
        outcome.kind()
    );
    Json(SkillResponse::simple_text(outcome.text()))
}

/// GET /healthz — liveness for the hosting platform. Does not touch the LLM.
async fn healthz() -> &'static str {
    "OK"
}

/// GET / returns a simple health JSON (for humans and probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "service": "chatbuddy",
        "port": state.port,
    }))
}
