//! Configuration loading, validation, and management for Hopper.
//!
//! Loads configuration from `~/.hopper/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.hopper/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reasoning engine connection
    #[serde(default)]
    pub engine: EngineConfig,

    /// Turn budgets
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Which wire flavour the engine speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Any `/chat/completions` endpoint with Bearer auth
    #[default]
    Openai,
    /// Azure OpenAI deployment with `api-key` auth
    Azure,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub kind: EngineKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Endpoint root (OpenAI: `.../v1`, Azure: `https://<resource>.openai.azure.com`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Azure deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_api_version() -> String {
    "2024-02-15-preview".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("kind", &self.kind)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            deployment: None,
            api_version: default_api_version(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Most recent messages kept in the prompt
    #[serde(default = "default_history_messages")]
    pub history_messages: usize,

    /// Estimated-token ceiling for the history part of the prompt
    #[serde(default = "default_context_token_budget")]
    pub context_token_budget: usize,

    #[serde(default = "default_engine_timeout_secs")]
    pub engine_timeout_secs: u64,

    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Extra attempts after a transient engine failure
    #[serde(default = "default_engine_retries")]
    pub engine_retries: u32,

    /// Results returned by `search_web`
    #[serde(default = "default_search_results")]
    pub search_results: usize,
}

fn default_history_messages() -> usize {
    20
}
fn default_context_token_budget() -> usize {
    3000
}
fn default_engine_timeout_secs() -> u64 {
    60
}
fn default_tool_timeout_secs() -> u64 {
    15
}
fn default_engine_retries() -> u32 {
    1
}
fn default_search_results() -> usize {
    3
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_messages: default_history_messages(),
            context_token_budget: default_context_token_budget(),
            engine_timeout_secs: default_engine_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            engine_retries: default_engine_retries(),
            search_results: default_search_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".into(),
        "http://127.0.0.1:5173".into(),
    ]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.hopper/config.toml),
    /// then apply environment overrides.
    ///
    /// Recognised variables:
    /// - `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_ENDPOINT`,
    ///   `AZURE_OPENAI_DEPLOYMENT_NAME`, `AZURE_OPENAI_API_VERSION`
    /// - `HOPPER_API_KEY`, `OPENAI_API_KEY`
    /// - `HOPPER_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Any Azure endpoint or deployment variable switches the engine to the
    /// Azure flavour.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let endpoint = var("AZURE_OPENAI_ENDPOINT").filter(|v| !v.is_empty());
        let deployment = var("AZURE_OPENAI_DEPLOYMENT_NAME").filter(|v| !v.is_empty());

        if endpoint.is_some() || deployment.is_some() {
            self.engine.kind = EngineKind::Azure;
        }
        if let Some(endpoint) = endpoint {
            self.engine.base_url = endpoint;
        }
        if let Some(deployment) = deployment {
            self.engine.deployment = Some(deployment);
        }
        if let Some(version) = var("AZURE_OPENAI_API_VERSION").filter(|v| !v.is_empty()) {
            self.engine.api_version = version;
        }

        if self.engine.api_key.is_none() {
            self.engine.api_key = ["AZURE_OPENAI_API_KEY", "HOPPER_API_KEY", "OPENAI_API_KEY"]
                .iter()
                .find_map(|key| var(key).filter(|v| !v.is_empty()));
        }

        if let Some(model) = var("HOPPER_MODEL").filter(|v| !v.is_empty()) {
            self.engine.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hopper")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.temperature < 0.0 || self.engine.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "engine.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.engine_timeout_secs == 0 || self.agent.tool_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent timeouts must be greater than zero".into(),
            ));
        }

        if self.agent.history_messages == 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_messages must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Whether enough is configured to reach the engine.
    pub fn is_engine_configured(&self) -> bool {
        let has_key = self.engine.api_key.as_deref().is_some_and(|k| !k.is_empty());
        let has_endpoint = !self.engine.base_url.is_empty();
        match self.engine.kind {
            EngineKind::Openai => has_key && has_endpoint,
            EngineKind::Azure => has_key && has_endpoint && self.engine.deployment.is_some(),
        }
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
