pub mod chat;
pub mod doctor;
pub mod init;
pub mod serve;
pub mod tools;

use std::sync::Arc;

use hopper_agent::Orchestrator;
use hopper_config::AppConfig;
use hopper_core::session::ConversationSession;
use hopper_tools::DuckDuckGoBackend;

/// Load the config, or explain where it is expected.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

/// Wire the configured engine, the built-in tools and a fresh session.
pub fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    let engine = hopper_providers::build_from_config(config);
    let tools = hopper_tools::default_registry(
        Arc::new(DuckDuckGoBackend::new()),
        config.agent.search_results,
    )?;

    Ok(Orchestrator::from_config(
        engine,
        Arc::new(tools),
        Arc::new(ConversationSession::new()),
        &config.agent,
    ))
}
