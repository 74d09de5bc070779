//! Sum tool: adds a list of numbers.

use async_trait::async_trait;
use hopper_core::error::{ExecutionFailure, ToolError};
use hopper_core::tool::{Tool, ToolOutput};

pub struct CalculateSumTool;

#[async_trait]
impl Tool for CalculateSumTool {
    fn name(&self) -> &str {
        "calculate_sum"
    }

    fn description(&self) -> &str {
        "Calculate the sum of a list of numbers. Use this for any addition of two or more values."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "numbers": {
                    "type": "array",
                    "items": { "type": "number" },
                    "description": "The numbers to add, e.g. [10, 20, 35]"
                }
            },
            "required": ["numbers"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let numbers: Vec<f64> = serde_json::from_value(arguments["numbers"].clone())
            .map_err(|e| ToolError::invalid_arguments(self.name(), e.to_string()))?;

        let total = calculate_sum(&numbers);
        if !total.is_finite() {
            return Err(ToolError::execution(
                self.name(),
                ExecutionFailure::Failed("sum overflowed".into()),
            ));
        }

        let listed: Vec<String> = numbers.iter().map(|n| format_number(*n)).collect();
        Ok(ToolOutput::new(
            format!("The sum of [{}] is {}", listed.join(", "), format_number(total)),
            serde_json::json!(total),
        ))
    }
}

/// Sum of all numbers; an empty slice sums to zero.
pub fn calculate_sum(numbers: &[f64]) -> f64 {
    numbers.iter().sum()
}

/// Render integral values without a trailing `.0`.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
