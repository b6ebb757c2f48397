//! Configuration loading, validation, and management for Wayfarer.
//!
//! Loads configuration from `~/.wayfarer/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod preferences;

/// The root configuration structure.
///
/// Maps directly to `~/.wayfarer/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Places (OpenStreetMap) configuration
    #[serde(default)]
    pub places: PlacesConfig,

    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("weather", &self.weather)
            .field("places", &self.places)
            .field("agent", &self.agent)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// OpenWeather API settings (current conditions + 5-day forecast).
#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeather API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_weather_url")]
    pub current_url: String,

    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".into()
}
fn default_forecast_url() -> String {
    "https://api.openweathermap.org/data/2.5/forecast".into()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            current_url: default_weather_url(),
            forecast_url: default_forecast_url(),
        }
    }
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &redact(&self.api_key))
            .field("current_url", &self.current_url)
            .field("forecast_url", &self.forecast_url)
            .finish()
    }
}

/// OpenStreetMap settings. No API key required; the usage policy asks for
/// a descriptive User-Agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,

    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Search radius around the geocoded point, in meters
    #[serde(default = "default_search_radius_m")]
    pub search_radius_m: u32,

    /// Maximum results returned per category query
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org/search".into()
}
fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".into()
}
fn default_user_agent() -> String {
    "Wayfarer/0.1 (travel assistant; rust)".into()
}
fn default_search_radius_m() -> u32 {
    3000
}
fn default_max_results() -> usize {
    12
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            nominatim_url: default_nominatim_url(),
            overpass_url: default_overpass_url(),
            user_agent: default_user_agent(),
            search_radius_m: default_search_radius_m(),
            max_results: default_max_results(),
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard cap on concurrent tool invocations within one round.
    /// The effective pool for a batch is `min(max_concurrent_tools, 2 × batch)`.
    #[serde(default = "default_max_concurrent_tools")]
    pub max_concurrent_tools: usize,

    /// Maximum execute rounds per turn before the loop is forced to stop
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

fn default_max_concurrent_tools() -> usize {
    32
}
fn default_max_rounds() -> u32 {
    16
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tools: default_max_concurrent_tools(),
            max_rounds: default_max_rounds(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.wayfarer/config.toml).
    ///
    /// Also checks environment variables:
    /// - `WAYFARER_API_KEY` / `OPENROUTER_API_KEY` / `OPENAI_API_KEY` — LLM key
    /// - `OPENWEATHER_API_KEY` — weather key
    /// - `WAYFARER_PROVIDER` / `WAYFARER_MODEL` — provider/model overrides
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("WAYFARER_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if config.weather.api_key.is_none() {
            config.weather.api_key = std::env::var("OPENWEATHER_API_KEY").ok();
        }

        if let Ok(provider) = std::env::var("WAYFARER_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("WAYFARER_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".wayfarer")
    }

    /// Path of the stored user travel preferences.
    pub fn preferences_path() -> PathBuf {
        Self::config_dir().join("preferences.txt")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_concurrent_tools == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_concurrent_tools must be at least 1".into(),
            ));
        }

        if self.agent.max_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_rounds must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an LLM API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            weather: WeatherConfig::default(),
            places: PlacesConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.agent.max_concurrent_tools, 32);
        assert!(config.weather.current_url.contains("openweathermap"));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.places.overpass_url, config.places.overpass_url);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_tool_concurrency_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_concurrent_tools = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn config_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_provider = "openrouter"
default_model = "anthropic/claude-sonnet-4"

[weather]
api_key = "ow-test"

[agent]
max_concurrent_tools = 8
max_rounds = 4
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_provider, "openrouter");
        assert_eq!(config.weather.api_key.as_deref(), Some("ow-test"));
        assert_eq!(config.agent.max_concurrent_tools, 8);
        assert_eq!(config.agent.max_rounds, 4);
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("openai"));
        assert!(toml_str.contains("overpass"));
    }
}
