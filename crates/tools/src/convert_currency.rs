//! Currency conversion over a fixed rate table.
//!
//! Only USD, EUR and INR are known. Rates are static; there is no feed.

use async_trait::async_trait;
use hopper_core::error::{ExecutionFailure, ToolError};
use hopper_core::tool::{Tool, ToolOutput};

const SUPPORTED: [&str; 3] = ["USD", "EUR", "INR"];

/// Direct rates. Reverse pairs use the reciprocal.
const RATES: [(&str, &str, f64); 3] = [("USD", "INR", 83.0), ("EUR", "INR", 90.0), ("USD", "EUR", 0.92)];

pub struct ConvertCurrencyTool;

#[async_trait]
impl Tool for ConvertCurrencyTool {
    fn name(&self) -> &str {
        "convert_currency"
    }

    fn description(&self) -> &str {
        "Convert an amount between currencies using fixed exchange rates. Supported codes: USD, EUR, INR."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "amount": {
                    "type": "number",
                    "description": "The amount to convert"
                },
                "from_currency": {
                    "type": "string",
                    "description": "Source currency code (USD, EUR, INR)"
                },
                "to_currency": {
                    "type": "string",
                    "description": "Target currency code (USD, EUR, INR)"
                }
            },
            "required": ["amount", "from_currency", "to_currency"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let amount = arguments["amount"]
            .as_f64()
            .ok_or_else(|| ToolError::invalid_arguments(self.name(), "'amount' must be a number"))?;
        let from = arguments["from_currency"].as_str().ok_or_else(|| {
            ToolError::invalid_arguments(self.name(), "'from_currency' must be a string")
        })?;
        let to = arguments["to_currency"].as_str().ok_or_else(|| {
            ToolError::invalid_arguments(self.name(), "'to_currency' must be a string")
        })?;

        let converted = convert(amount, from, to)?;
        if !converted.is_finite() {
            return Err(ToolError::execution(
                self.name(),
                ExecutionFailure::Failed("conversion overflowed".into()),
            ));
        }
        let (from, to) = (from.to_uppercase(), to.to_uppercase());

        Ok(ToolOutput::new(
            format!("{amount} {from} = {converted:.2} {to}"),
            serde_json::json!({
                "amount": amount,
                "from_currency": from,
                "to_currency": to,
                "converted": converted,
            }),
        ))
    }
}

/// Convert `amount` from one currency code to another. Codes are case-insensitive.
pub fn convert(amount: f64, from: &str, to: &str) -> Result<f64, ToolError> {
    let from = normalize(from)?;
    let to = normalize(to)?;
    Ok(amount * rate(&from, &to))
}

fn normalize(code: &str) -> Result<String, ToolError> {
    let upper = code.trim().to_uppercase();
    if SUPPORTED.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(ToolError::execution(
            "convert_currency",
            ExecutionFailure::UnsupportedCurrency(code.to_string()),
        ))
    }
}

/// Rate between two supported codes.
fn rate(from: &str, to: &str) -> f64 {
    if from == to {
        return 1.0;
    }
    RATES
        .iter()
        .find_map(|&(a, b, r)| {
            if a == from && b == to {
                Some(r)
            } else if a == to && b == from {
                Some(1.0 / r)
            } else {
                None
            }
        })
        // The table covers every ordered pair of distinct supported codes.
        .unwrap_or(1.0)
}
