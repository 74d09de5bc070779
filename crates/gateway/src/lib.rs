//! HTTP API gateway for Hopper.
//!
//! Exposes the agent over REST: chat, history reset, tool listing and
//! health checks. Every request shares one conversation.
//!
//! Built on Axum.

pub mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use hopper_agent::Orchestrator;
use hopper_config::AppConfig;
use hopper_core::session::ConversationSession;
use hopper_tools::DuckDuckGoBackend;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Orchestrator,
    pub config: AppConfig,
}

pub type SharedState = Arc<GatewayState>;

/// Build the router with all gateway routes.
///
/// Layers applied:
/// - CORS limited to `gateway.cors_origins`
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.cors_origins);

    Router::new()
        .route("/", get(routes::root_handler))
        .route("/health", get(routes::health_handler))
        .route("/chat", post(routes::chat_handler))
        .route("/clear-history", post(routes::clear_history_handler))
        .route("/tools", get(routes::tools_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Assemble engine, tools and session from the configuration.
pub fn build_state(config: AppConfig) -> Result<SharedState, Box<dyn std::error::Error>> {
    let engine = hopper_providers::build_from_config(&config);
    let tools = hopper_tools::default_registry(
        Arc::new(DuckDuckGoBackend::new()),
        config.agent.search_results,
    )?;
    let orchestrator = Orchestrator::from_config(
        engine,
        Arc::new(tools),
        Arc::new(ConversationSession::new()),
        &config.agent,
    );

    Ok(Arc::new(GatewayState {
        orchestrator,
        config,
    }))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if !config.is_engine_configured() {
        warn!("Reasoning engine is not configured; /chat will answer 503 until it is");
    }

    let state = build_state(config)?;
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
