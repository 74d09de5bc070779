//! Weather lookup tool: serves conditions from a fixed fixture set.
//!
//! No weather API is contacted. Unknown cities fail with
//! [`ExecutionFailure::CityNotFound`].

use async_trait::async_trait;
use hopper_core::error::{ExecutionFailure, ToolError};
use hopper_core::tool::{Tool, ToolOutput};
use serde::Serialize;

pub struct GetWeatherTool;

#[async_trait]
impl Tool for GetWeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a city. Returns temperature in Celsius, conditions and humidity. Known cities: Bangalore, Berlin, New York."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city name to look up weather for"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let city = arguments["city"]
            .as_str()
            .ok_or_else(|| ToolError::invalid_arguments(self.name(), "'city' must be a string"))?;

        let report = lookup(city)?;
        let text = format!(
            "Weather in {}: {}°C, {}, Humidity: {}%",
            report.city, report.temperature_c, report.condition, report.humidity
        );
        let data = serde_json::to_value(&report)
            .map_err(|e| ToolError::execution(self.name(), ExecutionFailure::Failed(e.to_string())))?;

        Ok(ToolOutput::new(text, data))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub city: String,
    pub temperature_c: i32,
    pub condition: String,
    pub humidity: u32,
}

/// (lowercase key, display name, °C, condition, humidity %)
const FIXTURES: [(&str, &str, i32, &str, u32); 3] = [
    ("bangalore", "Bangalore", 28, "Partly Cloudy", 65),
    ("berlin", "Berlin", 10, "Cloudy", 75),
    ("new york", "New York", 15, "Sunny", 55),
];

/// Case-insensitive fixture lookup.
pub fn lookup(city: &str) -> Result<WeatherReport, ToolError> {
    let key = city.trim().to_lowercase();
    FIXTURES
        .iter()
        .find(|(k, ..)| *k == key)
        .map(|&(_, name, temperature_c, condition, humidity)| WeatherReport {
            city: name.to_string(),
            temperature_c,
            condition: condition.to_string(),
            humidity,
        })
        .ok_or_else(|| {
            ToolError::execution("get_weather", ExecutionFailure::CityNotFound(city.to_string()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bangalore_fixture() {
        let report = lookup("Bangalore").unwrap();
        assert_eq!(
            report,
            WeatherReport {
                city: "Bangalore".into(),
                temperature_c: 28,
                condition: "Partly Cloudy".into(),
                humidity: 65,
            }
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("NEW YORK").unwrap().temperature_c, 15);
        assert_eq!(lookup("  berlin ").unwrap().condition, "Cloudy");
    }

    #[test]
    fn unknown_city_fails() {
        let err = lookup("Atlantis").unwrap_err();
        assert!(matches!(
            err,
            ToolError::Execution { failure: ExecutionFailure::CityNotFound(ref c), .. } if c == "Atlantis"
        ));
    }

    #[tokio::test]
    async fn tool_execute() {
        let result = GetWeatherTool
            .execute(serde_json::json!({"city": "berlin"}))
            .await
            .unwrap();

        assert_eq!(result.text, "Weather in Berlin: 10°C, Cloudy, Humidity: 75%");
        assert_eq!(result.data["humidity"], 75);
        assert_eq!(result.data["temperature_c"], 10);
    }

    #[test]
    fn tool_definition() {
        let def = GetWeatherTool.to_definition();
        assert_eq!(def.name, "get_weather");
    }
}
