//! Built-in tool implementations for Hopper.
//!
//! Tools give the agent data it cannot produce from language alone:
//! sums, currency conversion, the current date, weather, and web search.

pub mod calculate_sum;
pub mod convert_currency;
pub mod current_date;
pub mod get_weather;
pub mod search_web;

use std::sync::Arc;

use hopper_core::error::ToolError;
use hopper_core::tool::ToolRegistry;

pub use search_web::{DuckDuckGoBackend, SearchBackend, SearchResult};

/// Create a registry holding every built-in tool.
///
/// `search_backend` serves `search_web`, returning at most `search_results` hits.
pub fn default_registry(
    search_backend: Arc<dyn SearchBackend>,
    search_results: usize,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(calculate_sum::CalculateSumTool))?;
    registry.register(Box::new(convert_currency::ConvertCurrencyTool))?;
    registry.register(Box::new(current_date::CurrentDateTool))?;
    registry.register(Box::new(get_weather::GetWeatherTool))?;
    registry.register(Box::new(search_web::SearchWebTool::new(
        search_backend,
        search_results,
    )))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_core::error::ExecutionFailure;
    use hopper_core::tool::ToolCall;

    struct NoSearch;

    #[async_trait::async_trait]
    impl SearchBackend for NoSearch {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>, ExecutionFailure> {
            Ok(vec![])
        }
    }

    fn registry() -> ToolRegistry {
        default_registry(Arc::new(NoSearch), 3).unwrap()
    }

    fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: format!("call_{name}"),
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn registers_all_builtins_sorted() {
        let registry = registry();
        assert_eq!(
            registry.names(),
            vec![
                "calculate_sum",
                "convert_currency",
                "get_current_date",
                "get_weather",
                "search_web"
            ]
        );
    }

    #[tokio::test]
    async fn schemas_reject_bad_arguments() {
        let registry = registry();

        let err = registry
            .execute(&call("convert_currency", serde_json::json!({"amount": 5})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));

        let err = registry
            .execute(&call("calculate_sum", serde_json::json!({"numbers": "1,2"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn executes_through_registry() {
        let registry = registry();
        let output = registry
            .execute(&call("calculate_sum", serde_json::json!({"numbers": [10, 20, 35]})))
            .await
            .unwrap();
        assert_eq!(output.data, serde_json::json!(65.0));
    }
}
