//! Tool trait and registry: the abstraction over agent capabilities.
//!
//! Tools give the agent data it cannot produce from language alone:
//! arithmetic, exchange rates, the clock, weather, web search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ToolError;

/// A tool definition sent to the reasoning engine so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID (matches the engine's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The successful result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Human-readable rendering, fed back to the engine
    pub text: String,

    /// Structured value, returned to the caller in the trace
    pub data: serde_json::Value,
}

impl ToolOutput {
    pub fn new(text: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            text: text.into(),
            data,
        }
    }
}

/// The core Tool trait.
///
/// Executors must not touch shared state; the agent loop may run them in a
/// detached task and drop their result.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_weather").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the engine).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with arguments that already passed schema validation.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the engine.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

struct RegisteredTool {
    tool: Arc<dyn Tool>,
    validator: jsonschema::Validator,
}

/// A registry of available tools.
///
/// Populated once at startup and shared read-only afterwards. Iteration
/// order is by name, so the catalog sent to the engine is deterministic.
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool, compiling its parameter schema.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }

        let validator = jsonschema::validator_for(&tool.parameters_schema()).map_err(|e| {
            ToolError::InvalidSchema {
                tool_name: name.clone(),
                reason: e.to_string(),
            }
        })?;

        self.tools.insert(
            name,
            RegisteredTool {
                tool: Arc::from(tool),
                validator,
            },
        );
        Ok(())
    }

    /// Get a tool by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .get(name)
            .map(|t| t.tool.clone())
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool definitions, ordered by name.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.tool.to_definition()).collect()
    }

    /// Resolve a call to its tool, rejecting arguments that violate the schema.
    pub fn validate(&self, call: &ToolCall) -> Result<Arc<dyn Tool>, ToolError> {
        let entry = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        entry
            .validator
            .validate(&call.arguments)
            .map_err(|e| ToolError::invalid_arguments(&call.name, e.to_string()))?;

        Ok(entry.tool.clone())
    }

    /// Validate and execute a tool call.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        let tool = self.validate(call)?;
        tool.execute(call.arguments.clone()).await
    }

    /// List all registered tool names, ordered.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
