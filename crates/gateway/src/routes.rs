//! Request handlers and their wire types.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use hopper_agent::ToolSummary;
use hopper_config::EngineKind;
use hopper_core::error::AgentError;
use hopper_core::trace::TurnTrace;

use crate::SharedState;

// ── Request / Response types ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub configuration_valid: bool,
    pub engine: String,
    pub endpoint_configured: bool,
    pub api_key_configured: bool,
    pub deployment_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

/// A failed turn, rendered as `{error, detail}`.
pub struct ApiError(pub AgentError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            AgentError::EmptyMessage => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request"),
            AgentError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
            AgentError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
        };

        let body = ErrorResponse {
            error: error.to_string(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        status: "healthy",
        message: "Hopper agent API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let engine = &state.config.engine;
    let configuration_valid = state.config.is_engine_configured();

    Json(HealthResponse {
        status: if configuration_valid { "healthy" } else { "degraded" },
        configuration_valid,
        engine: state.orchestrator.engine_name().to_string(),
        endpoint_configured: !engine.base_url.is_empty(),
        api_key_configured: engine.api_key.as_deref().is_some_and(|k| !k.is_empty()),
        deployment_configured: match engine.kind {
            EngineKind::Azure => engine.deployment.as_deref().is_some_and(|d| !d.is_empty()),
            EngineKind::Openai => !engine.model.is_empty(),
        },
    })
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<TurnTrace>, ApiError> {
    info!(message_len = payload.message.len(), "Chat request");

    match state.orchestrator.submit_message(&payload.message).await {
        Ok(trace) => Ok(Json(trace)),
        Err(e) => {
            match &e {
                AgentError::EmptyMessage => warn!("Rejected empty chat message"),
                other => error!(error = %other, "Chat turn failed"),
            }
            Err(ApiError(e))
        }
    }
}

pub async fn clear_history_handler(State(state): State<SharedState>) -> Json<ClearHistoryResponse> {
    state.orchestrator.clear_history().await;
    Json(ClearHistoryResponse {
        status: "success",
        message: "Chat history cleared",
    })
}

pub async fn tools_handler(State(state): State<SharedState>) -> Json<ToolsResponse> {
    let tools = state.orchestrator.list_tools();
    Json(ToolsResponse {
        count: tools.len(),
        tools,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use hopper_agent::Orchestrator;
    use hopper_config::AppConfig;
    use hopper_core::engine::{Decision, Prompt, ReasoningEngine};
    use hopper_core::error::{EngineError, ExecutionFailure};
    use hopper_core::session::ConversationSession;
    use hopper_tools::{SearchBackend, SearchResult};
    use tower::ServiceExt;

    use crate::{GatewayState, SharedState, build_router};

    struct Script(Mutex<VecDeque<Result<Decision, EngineError>>>);

    #[async_trait]
    impl ReasoningEngine for Script {
        fn name(&self) -> &str {
            "script"
        }

        async fn decide(&self, _prompt: &Prompt) -> Result<Decision, EngineError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(EngineError::Network("script exhausted".into())))
        }
    }

    struct NoSearch;

    #[async_trait]
    impl SearchBackend for NoSearch {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>, ExecutionFailure> {
            Ok(vec![])
        }
    }

    fn state_with(script: Vec<Result<Decision, EngineError>>) -> SharedState {
        let tools = hopper_tools::default_registry(Arc::new(NoSearch), 3).unwrap();
        let orchestrator = Orchestrator::new(
            Arc::new(Script(Mutex::new(script.into()))),
            Arc::new(tools),
            Arc::new(ConversationSession::new()),
        )
        .with_engine_retries(0);

        Arc::new(GatewayState {
            orchestrator,
            config: AppConfig::default(),
        })
    }

    async fn send(state: SharedState, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = build_router(state).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn chat(message: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({"message": message}).to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn root_reports_running() {
        let (status, body) = send(state_with(vec![]), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn health_is_degraded_without_credentials() {
        let (status, body) = send(state_with(vec![]), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["configuration_valid"], false);
        assert_eq!(body["api_key_configured"], false);
        assert_eq!(body["engine"], "script");
    }

    #[tokio::test]
    async fn chat_returns_trace_for_direct_answer() {
        let state = state_with(vec![Ok(Decision::answer("Hello there"))]);
        let (status, body) = send(state, chat("hi")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Hello there");
        assert!(body["tool_used"].is_null());
        assert!(body["tool_output"].is_null());
    }

    #[tokio::test]
    async fn chat_returns_tool_trace() {
        let state = state_with(vec![
            Ok(Decision::use_tool(
                "calculate_sum",
                serde_json::json!({"numbers": [10, 20, 35]}),
                None,
            )),
            Ok(Decision::answer("The total is 65.")),
        ]);
        let (status, body) = send(state, chat("add 10, 20 and 35")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "The total is 65.");
        assert_eq!(body["tool_used"], "calculate_sum");
        assert_eq!(body["tool_output"], 65.0);
        assert!(body["thinking"].as_str().unwrap().contains("calculate_sum"));
    }

    #[tokio::test]
    async fn empty_message_is_unprocessable() {
        let (status, body) = send(state_with(vec![]), chat("   ")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "invalid_request");
        assert!(body["detail"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn engine_failure_is_service_unavailable() {
        let state = state_with(vec![Err(EngineError::NotConfigured("missing api_key".into()))]);
        let (status, body) = send(state.clone(), chat("hi")).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "service_unavailable");
        assert!(body["detail"].as_str().unwrap().contains("missing api_key"));
        assert_eq!(state.orchestrator.session().len().await, 1);
    }

    #[tokio::test]
    async fn engine_timeout_is_gateway_timeout() {
        let state = state_with(vec![Err(EngineError::Timeout("60s elapsed".into()))]);
        let (status, body) = send(state, chat("hi")).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"], "timeout");
    }

    #[tokio::test]
    async fn clear_history_empties_the_session() {
        let state = state_with(vec![Ok(Decision::answer("Hello"))]);
        send(state.clone(), chat("hi")).await;
        assert_eq!(state.orchestrator.session().len().await, 2);

        let req = Request::builder()
            .method("POST")
            .uri("/clear-history")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(state.clone(), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert!(state.orchestrator.session().is_empty().await);
    }

    #[tokio::test]
    async fn tools_lists_every_builtin() {
        let (status, body) = send(state_with(vec![]), get("/tools")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 5);
        let names: Vec<&str> = body["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        for expected in ["calculate_sum", "convert_currency", "get_current_date", "get_weather", "search_web"] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn missing_message_field_is_rejected() {
        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = build_router(state_with(vec![])).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
