//! Weather tools backed by the OpenWeather API.
//!
//! Two tools share one [`WeatherClient`]: `get_current_temperature`
//! (current conditions) and `get_weather_forecast` (5-day / 3-hour
//! forecast, summarized per day). The forecast endpoint only covers the
//! next 5 days; the system prompt tells the model not to promise more.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use wayfarer_config::WeatherConfig;
use wayfarer_core::error::ToolError;
use wayfarer_core::tool::{Tool, ToolKind, ToolResult};

/// Shared HTTP client for the OpenWeather endpoints.
pub struct WeatherClient {
    client: reqwest::Client,
    api_key: Option<String>,
    current_url: String,
    forecast_url: String,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: config.api_key.clone(),
            current_url: config.current_url.clone(),
            forecast_url: config.forecast_url.clone(),
        }
    }

    fn key(&self, tool_name: &str) -> Result<&str, ToolError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: "OPENWEATHER_API_KEY is not configured".into(),
            })
    }

    async fn fetch(
        &self,
        tool_name: &str,
        url: &str,
        location: &str,
        units: &str,
    ) -> Result<serde_json::Value, ToolError> {
        let key = self.key(tool_name)?;

        debug!(tool = tool_name, location, units, "Fetching weather data");

        let response = self
            .client
            .get(url)
            .query(&[("q", location), ("appid", key), ("units", units)])
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: format!("location not found: {location}"),
            });
        }
        if status != 200 {
            return Err(ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: format!("weather API returned status {status}"),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: format!("failed to parse weather response: {e}"),
            })
    }

    async fn current(&self, location: &str, units: &str) -> Result<CurrentWeather, ToolError> {
        let body = self
            .fetch("get_current_temperature", &self.current_url, location, units)
            .await?;
        parse_current(&body, location, units)
    }

    async fn forecast(
        &self,
        location: &str,
        units: &str,
        days: usize,
    ) -> Result<Vec<DailyForecast>, ToolError> {
        let body = self
            .fetch("get_weather_forecast", &self.forecast_url, location, units)
            .await?;
        Ok(parse_forecast(&body, days))
    }
}

#[derive(Debug, serde::Serialize)]
struct CurrentWeather {
    location: String,
    temperature: f64,
    feels_like: f64,
    units: String,
    conditions: String,
    humidity: u64,
    wind_speed: f64,
}

#[derive(Debug, serde::Serialize)]
struct DailyForecast {
    date: String,
    min_temp: f64,
    max_temp: f64,
    conditions: String,
}

fn unit_label(units: &str) -> &'static str {
    if units == "imperial" { "°F" } else { "°C" }
}

/// Extract the fields we care about from a current-conditions payload.
fn parse_current(
    body: &serde_json::Value,
    location: &str,
    units: &str,
) -> Result<CurrentWeather, ToolError> {
    let main = &body["main"];
    let temperature = main["temp"].as_f64().ok_or_else(|| ToolError::ExecutionFailed {
        tool_name: "get_current_temperature".into(),
        reason: "weather response is missing temperature".into(),
    })?;

    Ok(CurrentWeather {
        location: body["name"].as_str().unwrap_or(location).to_string(),
        temperature,
        feels_like: main["feels_like"].as_f64().unwrap_or(temperature),
        units: unit_label(units).to_string(),
        conditions: body["weather"][0]["description"]
            .as_str()
            .unwrap_or("unknown")
            .to_string(),
        humidity: main["humidity"].as_u64().unwrap_or(0),
        wind_speed: body["wind"]["speed"].as_f64().unwrap_or(0.0),
    })
}

/// Bucket the 3-hourly forecast entries into per-day min/max summaries.
///
/// Entries carry `dt_txt` as "YYYY-MM-DD HH:MM:SS"; the date prefix is the
/// bucket key and the conditions of the midday entry represent the day.
fn parse_forecast(body: &serde_json::Value, days: usize) -> Vec<DailyForecast> {
    #[derive(Deserialize)]
    struct Entry {
        dt_txt: String,
        main: EntryMain,
        #[serde(default)]
        weather: Vec<EntryWeather>,
    }
    #[derive(Deserialize)]
    struct EntryMain {
        temp: f64,
    }
    #[derive(Deserialize)]
    struct EntryWeather {
        description: String,
    }

    let entries: Vec<Entry> = body["list"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    let mut daily: Vec<DailyForecast> = Vec::new();
    for entry in entries {
        let Some((date, time)) = entry.dt_txt.split_once(' ') else {
            continue;
        };
        let conditions = entry
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "unknown".into());

        match daily.iter_mut().find(|d| d.date == date) {
            Some(day) => {
                day.min_temp = day.min_temp.min(entry.main.temp);
                day.max_temp = day.max_temp.max(entry.main.temp);
                // Midday entry is the most representative sample of the day
                if time.starts_with("12:") {
                    day.conditions = conditions;
                }
            }
            None => {
                if daily.len() >= days {
                    break;
                }
                daily.push(DailyForecast {
                    date: date.to_string(),
                    min_temp: entry.main.temp,
                    max_temp: entry.main.temp,
                    conditions,
                });
            }
        }
    }
    daily
}

/// Tool: current temperature and conditions for a location.
pub struct CurrentTemperatureTool {
    client: Arc<WeatherClient>,
}

impl CurrentTemperatureTool {
    pub fn new(client: Arc<WeatherClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CurrentTemperatureTool {
    fn name(&self) -> &str {
        "get_current_temperature"
    }

    fn description(&self) -> &str {
        "Get the current temperature and conditions for a location. \
         Returns temperature, feels-like, conditions, humidity, and wind speed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city name to look up weather for"
                },
                "units": {
                    "type": "string",
                    "enum": ["metric", "imperial"],
                    "description": "Temperature units (default: metric)",
                    "default": "metric"
                }
            },
            "required": ["location"]
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Weather
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let location = arguments["location"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'location' argument".into()))?;
        let units = arguments["units"].as_str().unwrap_or("metric");

        let weather = self.client.current(location, units).await?;
        let output = serde_json::to_string_pretty(&weather).unwrap_or_default();

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
            data: serde_json::to_value(&weather).ok(),
        })
    }
}

/// Tool: per-day forecast for the next 5 days.
pub struct WeatherForecastTool {
    client: Arc<WeatherClient>,
}

impl WeatherForecastTool {
    pub fn new(client: Arc<WeatherClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WeatherForecastTool {
    fn name(&self) -> &str {
        "get_weather_forecast"
    }

    fn description(&self) -> &str {
        "Get the weather forecast for a location, one summary per day. \
         Covers at most the next 5 days; later dates are not available."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city name to look up the forecast for"
                },
                "days": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 5,
                    "description": "How many days to include (default: 5)",
                    "default": 5
                },
                "units": {
                    "type": "string",
                    "enum": ["metric", "imperial"],
                    "description": "Temperature units (default: metric)",
                    "default": "metric"
                }
            },
            "required": ["location"]
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Weather
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let location = arguments["location"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'location' argument".into()))?;
        let units = arguments["units"].as_str().unwrap_or("metric");
        let days = arguments["days"].as_u64().unwrap_or(5).clamp(1, 5) as usize;

        let forecast = self.client.forecast(location, units, days).await?;
        let summary = serde_json::json!({
            "location": location,
            "units": unit_label(units),
            "daily": forecast,
        });
        let output = serde_json::to_string_pretty(&summary).unwrap_or_default();

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
            data: Some(summary),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Arc<WeatherClient> {
        Arc::new(WeatherClient::new(&WeatherConfig::default()))
    }

    #[test]
    fn tool_definitions() {
        let current = CurrentTemperatureTool::new(client());
        let def = current.to_definition();
        assert_eq!(def.name, "get_current_temperature");
        assert_eq!(def.parameters["required"], serde_json::json!(["location"]));

        let forecast = WeatherForecastTool::new(client());
        let def = forecast.to_definition();
        assert_eq!(def.name, "get_weather_forecast");
        assert_eq!(def.parameters["properties"]["days"]["maximum"], 5);
    }

    #[test]
    fn tools_are_weather_kind() {
        assert_eq!(CurrentTemperatureTool::new(client()).kind(), ToolKind::Weather);
        assert_eq!(WeatherForecastTool::new(client()).kind(), ToolKind::Weather);
    }

    #[tokio::test]
    async fn missing_location_returns_error() {
        let tool = CurrentTemperatureTool::new(client());
        let result = tool.execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn missing_api_key_reported_as_execution_failure() {
        let tool = CurrentTemperatureTool::new(client());
        let err = tool
            .execute(serde_json::json!({"location": "Paris"}))
            .await
            .unwrap_err();
        match err {
            ToolError::ExecutionFailed { reason, .. } => {
                assert!(reason.contains("OPENWEATHER_API_KEY"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_current_extracts_fields() {
        let body = serde_json::json!({
            "name": "Paris",
            "main": {"temp": 21.3, "feels_like": 20.1, "humidity": 55},
            "weather": [{"description": "scattered clouds"}],
            "wind": {"speed": 4.2}
        });
        let weather = parse_current(&body, "paris", "metric").unwrap();
        assert_eq!(weather.location, "Paris");
        assert_eq!(weather.temperature, 21.3);
        assert_eq!(weather.conditions, "scattered clouds");
        assert_eq!(weather.humidity, 55);
        assert_eq!(weather.units, "°C");
    }

    #[test]
    fn parse_current_missing_temp_is_error() {
        let body = serde_json::json!({"name": "Paris", "main": {}});
        assert!(parse_current(&body, "paris", "metric").is_err());
    }

    #[test]
    fn parse_forecast_buckets_by_day() {
        let body = serde_json::json!({
            "list": [
                {"dt_txt": "2026-08-08 09:00:00", "main": {"temp": 18.0},
                 "weather": [{"description": "light rain"}]},
                {"dt_txt": "2026-08-08 12:00:00", "main": {"temp": 24.0},
                 "weather": [{"description": "clear sky"}]},
                {"dt_txt": "2026-08-08 18:00:00", "main": {"temp": 20.0},
                 "weather": [{"description": "few clouds"}]},
                {"dt_txt": "2026-08-09 12:00:00", "main": {"temp": 26.0},
                 "weather": [{"description": "clear sky"}]}
            ]
        });
        let daily = parse_forecast(&body, 5);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, "2026-08-08");
        assert_eq!(daily[0].min_temp, 18.0);
        assert_eq!(daily[0].max_temp, 24.0);
        // Midday sample wins for the day's conditions
        assert_eq!(daily[0].conditions, "clear sky");
        assert_eq!(daily[1].date, "2026-08-09");
    }

    #[test]
    fn parse_forecast_respects_day_limit() {
        let body = serde_json::json!({
            "list": [
                {"dt_txt": "2026-08-08 12:00:00", "main": {"temp": 20.0}, "weather": []},
                {"dt_txt": "2026-08-09 12:00:00", "main": {"temp": 21.0}, "weather": []},
                {"dt_txt": "2026-08-10 12:00:00", "main": {"temp": 22.0}, "weather": []}
            ]
        });
        let daily = parse_forecast(&body, 2);
        assert_eq!(daily.len(), 2);
    }

    #[test]
    fn parse_forecast_empty_body() {
        let daily = parse_forecast(&serde_json::json!({}), 5);
        assert!(daily.is_empty());
    }
}
