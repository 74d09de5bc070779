//! Engine selection: builds the configured reasoning engine.

use std::sync::Arc;

use async_trait::async_trait;
use hopper_config::{AppConfig, EngineKind};
use hopper_core::engine::{Decision, Prompt, ReasoningEngine};
use hopper_core::error::EngineError;
use tracing::{info, warn};

use crate::openai_compat::OpenAiCompatEngine;

/// Build the engine described by the configuration.
///
/// An incomplete configuration still yields an engine, one that fails every
/// decision with [`EngineError::NotConfigured`], so the service can start
/// and report itself degraded.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn ReasoningEngine> {
    if !config.is_engine_configured() {
        warn!(kind = ?config.engine.kind, "Engine configuration is incomplete");
        return Arc::new(UnconfiguredEngine {
            reason: missing_settings(config),
        });
    }

    let engine = &config.engine;
    let api_key = engine.api_key.clone().unwrap_or_default();

    let built = match engine.kind {
        EngineKind::Openai => OpenAiCompatEngine::openai(&engine.base_url, api_key, &engine.model),
        EngineKind::Azure => OpenAiCompatEngine::azure(
            &engine.base_url,
            api_key,
            engine.deployment.clone().unwrap_or_default(),
            &engine.api_version,
        ),
    };

    info!(kind = ?engine.kind, model = %engine.model, "Reasoning engine ready");
    Arc::new(built.with_sampling(engine.temperature, engine.max_tokens))
}

fn missing_settings(config: &AppConfig) -> String {
    let engine = &config.engine;
    let mut missing = Vec::new();
    if engine.api_key.as_deref().is_none_or(str::is_empty) {
        missing.push("api_key");
    }
    if engine.base_url.is_empty() {
        missing.push("base_url");
    }
    if engine.kind == EngineKind::Azure && engine.deployment.is_none() {
        missing.push("deployment");
    }
    format!("missing {}", missing.join(", "))
}

/// Stand-in used when no engine can be reached.
pub struct UnconfiguredEngine {
    reason: String,
}

#[async_trait]
impl ReasoningEngine for UnconfiguredEngine {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn decide(&self, _prompt: &Prompt) -> Result<Decision, EngineError> {
        Err(EngineError::NotConfigured(self.reason.clone()))
    }

    async fn health_check(&self) -> Result<bool, EngineError> {
        Ok(false)
    }
}
