//! OpenAI-compatible reasoning engine.
//!
//! Speaks the `/chat/completions` function-calling protocol, either against
//! any OpenAI-compatible endpoint (Bearer auth) or an Azure OpenAI
//! deployment (`api-key` header, deployment path, `api-version` query).
//!
//! The model's reply is reduced to a [`Decision`]: the first tool call wins,
//! otherwise the message content is the answer.

use async_trait::async_trait;
use hopper_core::engine::{Decision, Prompt, ReasoningEngine};
use hopper_core::error::EngineError;
use hopper_core::message::Role;
use hopper_core::tool::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How requests are addressed and authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flavour {
    /// `{base_url}/chat/completions`, `Authorization: Bearer`
    OpenAi,
    /// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`, `api-key`
    Azure {
        deployment: String,
        api_version: String,
    },
}

/// A reasoning engine backed by an OpenAI-compatible chat completions API.
pub struct OpenAiCompatEngine {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    flavour: Flavour,
    client: reqwest::Client,
}

impl OpenAiCompatEngine {
    /// Create an engine for a plain OpenAI-compatible endpoint.
    pub fn openai(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::new("openai", base_url.into(), api_key.into(), model.into(), Flavour::OpenAi)
    }

    /// Create an engine for an Azure OpenAI deployment.
    pub fn azure(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        let deployment = deployment.into();
        Self::new(
            "azure",
            endpoint.into(),
            api_key.into(),
            deployment.clone(),
            Flavour::Azure {
                deployment,
                api_version: api_version.into(),
            },
        )
    }

    fn new(name: &str, base_url: String, api_key: String, model: String, flavour: Flavour) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            temperature: 0.7,
            max_tokens: 1000,
            flavour,
            client,
        }
    }

    /// Override sampling settings.
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn completions_request(&self) -> reqwest::RequestBuilder {
        match &self.flavour {
            Flavour::OpenAi => self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key)),
            Flavour::Azure {
                deployment,
                api_version,
            } => self
                .client
                .post(format!(
                    "{}/openai/deployments/{}/chat/completions",
                    self.base_url, deployment
                ))
                .query(&[("api-version", api_version.as_str())])
                .header("api-key", &self.api_key),
        }
    }

    /// Render a prompt as chat messages.
    ///
    /// An observation becomes the assistant's tool call followed by the
    /// tool's reply, the shape the API expects for a finished call.
    fn to_api_messages(prompt: &Prompt) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(prompt.history.len() + 4);

        if !prompt.instructions.is_empty() {
            messages.push(ApiMessage::text("system", &prompt.instructions));
        }

        for message in &prompt.history {
            let role = match message.role {
                Role::User => "user",
                Role::Agent => "assistant",
            };
            messages.push(ApiMessage::text(role, &message.content));
        }

        messages.push(ApiMessage::text("user", &prompt.user_turn));

        if let Some(observation) = &prompt.observation {
            messages.push(ApiMessage {
                role: "assistant".into(),
                content: observation.rationale.clone(),
                tool_calls: Some(vec![ApiToolCall {
                    id: observation.call.id.clone(),
                    r#type: "function".into(),
                    function: ApiFunction {
                        name: observation.call.name.clone(),
                        arguments: observation.call.arguments.to_string(),
                    },
                }]),
                tool_call_id: None,
            });
            messages.push(ApiMessage {
                role: "tool".into(),
                content: Some(observation.content.clone()),
                tool_calls: None,
                tool_call_id: Some(observation.call.id.clone()),
            });
        }

        messages
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn request_body(&self, prompt: &Prompt) -> serde_json::Value {
        let mut body = serde_json::json!({
            "messages": Self::to_api_messages(prompt),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        if self.flavour == Flavour::OpenAi {
            body["model"] = serde_json::json!(self.model);
        }

        if !prompt.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&prompt.tools));
        }

        body
    }
}

/// Reduce the first choice of a completion to a decision.
fn into_decision(response: ApiResponse) -> Result<Decision, EngineError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::MalformedResponse("No choices in response".into()))?;

    let content = choice.message.content.filter(|c| !c.trim().is_empty());
    let mut tool_calls = choice.message.tool_calls.unwrap_or_default();

    if tool_calls.len() > 1 {
        warn!(
            requested = tool_calls.len(),
            "Engine requested several tools; only the first is used"
        );
    }

    if !tool_calls.is_empty() {
        let first = tool_calls.swap_remove(0);
        return Ok(Decision::UseTool {
            call: ToolCall {
                id: first.id,
                arguments: parse_arguments(&first.function.arguments),
                name: first.function.name,
            },
            rationale: content,
        });
    }

    content
        .map(Decision::answer)
        .ok_or_else(|| EngineError::MalformedResponse("Response had neither content nor a tool call".into()))
}

/// Tool arguments arrive as a JSON-encoded string.
///
/// An empty string means no arguments. Text that is not JSON is passed on
/// as a string so schema validation rejects it.
fn parse_arguments(raw: &str) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[async_trait]
impl ReasoningEngine for OpenAiCompatEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn decide(&self, prompt: &Prompt) -> Result<Decision, EngineError> {
        let body = self.request_body(prompt);

        debug!(
            engine = %self.name,
            model = %self.model,
            messages = prompt.history.len() + 1,
            tools = prompt.tools.len(),
            "Sending completion request"
        );

        let response = self
            .completions_request()
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout(e.to_string())
                } else {
                    EngineError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(EngineError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(EngineError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Engine returned error");
            return Err(EngineError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        into_decision(api_response)
    }

    async fn health_check(&self) -> Result<bool, EngineError> {
        let request = match &self.flavour {
            Flavour::OpenAi => self
                .client
                .get(format!("{}/models", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key)),
            Flavour::Azure { api_version, .. } => self
                .client
                .get(format!("{}/openai/models", self.base_url))
                .query(&[("api-version", api_version.as_str())])
                .header("api-key", &self.api_key),
        };

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ApiMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: ApiFunction,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_core::engine::Observation;
    use hopper_core::message::Message;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(message: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{"index": 0, "message": message, "finish_reason": "stop"}]
        }))
    }

    fn weather_tool() -> ToolDefinition {
        ToolDefinition {
            name: "get_weather".into(),
            description: "Weather for a city".into(),
            parameters: serde_json::json!({"type": "object"}),
        }
    }

    fn prompt(user_turn: &str) -> Prompt {
        Prompt {
            instructions: "You are helpful".into(),
            tools: vec![weather_tool()],
            user_turn: user_turn.into(),
            ..Prompt::default()
        }
    }

    #[test]
    fn message_conversion_maps_roles() {
        let mut p = prompt("And now?");
        p.history = vec![Message::user("Hi"), Message::agent("Hello!")];

        let api = OpenAiCompatEngine::to_api_messages(&p);
        let roles: Vec<&str> = api.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(api[3].content.as_deref(), Some("And now?"));
    }

    #[test]
    fn observation_becomes_tool_exchange() {
        let mut p = prompt("Weather in Berlin?");
        p.tools.clear();
        p.observation = Some(Observation {
            call: ToolCall {
                id: "call_1".into(),
                name: "get_weather".into(),
                arguments: serde_json::json!({"city": "Berlin"}),
            },
            rationale: None,
            content: "Weather in Berlin: 10°C".into(),
            success: true,
        });

        let api = OpenAiCompatEngine::to_api_messages(&p);
        let call_msg = &api[api.len() - 2];
        let tool_msg = &api[api.len() - 1];

        assert_eq!(call_msg.role, "assistant");
        let calls = call_msg.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "get_weather");
        assert_eq!(calls[0].function.arguments, r#"{"city":"Berlin"}"#);
        assert_eq!(tool_msg.role, "tool");
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn tool_definition_conversion() {
        let api_tools = OpenAiCompatEngine::to_api_tools(&[weather_tool()]);
        assert_eq!(api_tools.len(), 1);
        assert_eq!(api_tools[0].function.name, "get_weather");
        assert_eq!(api_tools[0].r#type, "function");
    }

    #[test]
    fn argument_parsing() {
        assert_eq!(parse_arguments(""), serde_json::json!({}));
        assert_eq!(parse_arguments(r#"{"a":1}"#), serde_json::json!({"a": 1}));
        assert_eq!(parse_arguments("{oops"), serde_json::json!("{oops"));
    }

    #[tokio::test]
    async fn answer_without_tool_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
            .respond_with(completion(serde_json::json!({
                "role": "assistant",
                "content": "Hello there!"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let engine = OpenAiCompatEngine::openai(server.uri(), "sk-test", "gpt-4o-mini");
        let decision = engine.decide(&prompt("Hi")).await.unwrap();

        assert_eq!(decision, Decision::answer("Hello there!"));
    }

    #[tokio::test]
    async fn first_tool_call_wins() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(completion(serde_json::json!({
                "role": "assistant",
                "content": "Need live weather",
                "tool_calls": [
                    {"id": "call_a", "type": "function",
                     "function": {"name": "get_weather", "arguments": "{\"city\":\"Berlin\"}"}},
                    {"id": "call_b", "type": "function",
                     "function": {"name": "search_web", "arguments": "{\"query\":\"x\"}"}}
                ]
            })))
            .mount(&server)
            .await;

        let engine = OpenAiCompatEngine::openai(server.uri(), "sk-test", "gpt-4o-mini");
        let decision = engine.decide(&prompt("Weather in Berlin?")).await.unwrap();

        match decision {
            Decision::UseTool { call, rationale } => {
                assert_eq!(call.id, "call_a");
                assert_eq!(call.name, "get_weather");
                assert_eq!(call.arguments, serde_json::json!({"city": "Berlin"}));
                assert_eq!(rationale.as_deref(), Some("Need live weather"));
            }
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn azure_addresses_deployment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o/chat/completions"))
            .and(query_param("api-version", "2024-02-15-preview"))
            .and(header("api-key", "azure-key"))
            .respond_with(completion(serde_json::json!({"content": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let engine =
            OpenAiCompatEngine::azure(server.uri(), "azure-key", "gpt-4o", "2024-02-15-preview");
        assert_eq!(engine.name(), "azure");
        let decision = engine.decide(&prompt("ping")).await.unwrap();
        assert_eq!(decision, Decision::answer("ok"));
    }

    #[tokio::test]
    async fn azure_health_check_contacts_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openai/models"))
            .and(query_param("api-version", "2024-02-15-preview"))
            .and(header("api-key", "azure-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let engine =
            OpenAiCompatEngine::azure(server.uri(), "azure-key", "gpt-4o", "2024-02-15-preview");
        assert!(engine.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn azure_health_check_reports_rejected_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openai/models"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let engine = OpenAiCompatEngine::azure(server.uri(), "bad", "gpt-4o", "2024-02-15-preview");
        assert!(!engine.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn azure_health_check_fails_on_dead_host() {
        let engine =
            OpenAiCompatEngine::azure("http://127.0.0.1:9", "key", "gpt-4o", "2024-02-15-preview");
        let err = engine.health_check().await.unwrap_err();
        assert!(matches!(err, EngineError::Network(_)));
    }

    #[tokio::test]
    async fn status_codes_map_to_errors() {
        let cases = [
            (401, "auth"),
            (429, "rate"),
            (500, "api"),
        ];

        for (status, kind) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
                .mount(&server)
                .await;

            let engine = OpenAiCompatEngine::openai(server.uri(), "k", "m");
            let err = engine.decide(&prompt("x")).await.unwrap_err();

            match (kind, &err) {
                ("auth", EngineError::AuthenticationFailed(_)) => {}
                ("rate", EngineError::RateLimited { .. }) => assert!(err.is_transient()),
                ("api", EngineError::ApiError { status_code: 500, .. }) => assert!(err.is_transient()),
                _ => panic!("status {status} mapped to {err:?}"),
            }
        }
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let engine = OpenAiCompatEngine::openai(server.uri(), "k", "m");
        let err = engine.decide(&prompt("x")).await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn empty_message_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion(serde_json::json!({"role": "assistant", "content": null})))
            .mount(&server)
            .await;

        let engine = OpenAiCompatEngine::openai(server.uri(), "k", "m");
        let err = engine.decide(&prompt("x")).await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let engine = OpenAiCompatEngine::openai("http://127.0.0.1:1", "k", "m");
        let err = engine.decide(&prompt("x")).await.unwrap_err();
        assert!(matches!(err, EngineError::Network(_)));
    }
}
