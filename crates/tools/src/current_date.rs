//! Clock tool: reports the local date and time.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use hopper_core::error::ToolError;
use hopper_core::tool::{Tool, ToolOutput};

const DISPLAY_FORMAT: &str = "%A, %B %d, %Y at %I:%M %p";

pub struct CurrentDateTool;

#[async_trait]
impl Tool for CurrentDateTool {
    fn name(&self) -> &str {
        "get_current_date"
    }

    fn description(&self) -> &str {
        "Get the current local date and time."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        Ok(render(Local::now()))
    }
}

fn render(now: DateTime<Local>) -> ToolOutput {
    let formatted = now.format(DISPLAY_FORMAT).to_string();
    ToolOutput::new(
        format!("Current date and time: {formatted}"),
        serde_json::json!({
            "formatted": formatted,
            "iso": now.to_rfc3339(),
        }),
    )
}
