//! Web search tool: top results from DuckDuckGo's HTML endpoint.
//!
//! The tool talks to a [`SearchBackend`]; the default backend scrapes
//! `html.duckduckgo.com`. Zero hits is a successful, empty result.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hopper_core::error::{ExecutionFailure, ToolError};
use hopper_core::tool::{Tool, ToolOutput};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

const DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Something that can answer a search query.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ExecutionFailure>;
}

/// Scrapes DuckDuckGo's no-JavaScript results page.
pub struct DuckDuckGoBackend {
    client: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoBackend {
    pub fn new() -> Self {
        Self::with_base_url(DUCKDUCKGO_URL)
    }

    /// Point the backend at another host serving the same page layout.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for DuckDuckGoBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoBackend {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ExecutionFailure> {
        let url = format!("{}/html/", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| ExecutionFailure::SearchUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExecutionFailure::SearchUnavailable(format!(
                "DuckDuckGo returned HTTP {}",
                status.as_u16()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ExecutionFailure::SearchUnavailable(e.to_string()))?;

        parse_results(&html, limit)
    }
}

/// Extract up to `limit` results from a DuckDuckGo HTML page.
pub fn parse_results(html: &str, limit: usize) -> Result<Vec<SearchResult>, ExecutionFailure> {
    let selector = |s: &str| {
        Selector::parse(s).map_err(|e| ExecutionFailure::Failed(format!("selector {s}: {e:?}")))
    };
    let result_selector = selector(".result")?;
    let title_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for element in document.select(&result_selector) {
        if results.len() >= limit {
            break;
        }

        let Some(anchor) = element.select(&title_selector).next() else {
            continue;
        };
        let title = collapse_text(anchor);
        if title.is_empty() {
            continue;
        }

        let url = anchor
            .value()
            .attr("href")
            .map(resolve_redirect)
            .unwrap_or_default();
        let snippet = element
            .select(&snippet_selector)
            .next()
            .map(collapse_text)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "No description".to_string());

        results.push(SearchResult { title, url, snippet });
    }

    Ok(results)
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// DuckDuckGo wraps targets as `//duckduckgo.com/l/?uddg=<encoded>&...`.
fn resolve_redirect(href: &str) -> String {
    href.split_once("uddg=")
        .map(|(_, rest)| rest.split('&').next().unwrap_or(rest))
        .and_then(|encoded| urlencoding::decode(encoded).ok())
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|| href.to_string())
}

pub struct SearchWebTool {
    backend: Arc<dyn SearchBackend>,
    max_results: usize,
}

impl SearchWebTool {
    pub fn new(backend: Arc<dyn SearchBackend>, max_results: usize) -> Self {
        Self {
            backend,
            max_results,
        }
    }
}

#[async_trait]
impl Tool for SearchWebTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns the top results with titles, URLs, and snippets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::invalid_arguments(self.name(), "'query' must be a string"))?;

        let results = self
            .backend
            .search(query, self.max_results)
            .await
            .map_err(|failure| ToolError::execution(self.name(), failure))?;

        tracing::debug!(query, hits = results.len(), "Web search finished");

        let text = if results.is_empty() {
            format!("No search results found for '{query}'")
        } else {
            let lines: Vec<String> = results
                .iter()
                .map(|r| format!("**{}**: {}", r.title, r.snippet))
                .collect();
            format!("Search results for '{query}':\n\n{}", lines.join("\n\n"))
        };

        let data = serde_json::to_value(&results)
            .map_err(|e| ToolError::execution(self.name(), ExecutionFailure::Failed(e.to_string())))?;

        Ok(ToolOutput::new(text, data))
    }
}
