//! Built-in tool implementations for Wayfarer.
//!
//! Tools give the assistant its view of the world: current weather and
//! 5-day forecasts via OpenWeather, and points of interest (restaurants,
//! museums, parks) via OpenStreetMap's Nominatim + Overpass APIs.

pub mod places;
pub mod weather;

use std::sync::Arc;
use wayfarer_config::AppConfig;
use wayfarer_core::tool::ToolRegistry;

pub use places::SearchPlacesTool;
pub use weather::{CurrentTemperatureTool, WeatherClient, WeatherForecastTool};

/// Create the default tool registry from configuration.
///
/// Registers the two weather tools (sharing one HTTP client) and the
/// places search tool.
pub fn default_registry(config: &AppConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    let weather = Arc::new(WeatherClient::new(&config.weather));
    registry.register(Box::new(CurrentTemperatureTool::new(weather.clone())));
    registry.register(Box::new(WeatherForecastTool::new(weather)));
    registry.register(Box::new(SearchPlacesTool::new(&config.places)));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core::tool::ToolKind;

    #[test]
    fn default_registry_has_all_tools() {
        let registry = default_registry(&AppConfig::default());
        let mut names = registry.names();
        names.sort();
        assert_eq!(
            names,
            vec![
                "get_current_temperature",
                "get_weather_forecast",
                "search_places"
            ]
        );
    }

    #[test]
    fn tools_carry_their_categories() {
        let registry = default_registry(&AppConfig::default());
        assert_eq!(
            registry.kind_of("get_current_temperature"),
            Some(ToolKind::Weather)
        );
        assert_eq!(
            registry.kind_of("get_weather_forecast"),
            Some(ToolKind::Weather)
        );
        assert_eq!(registry.kind_of("search_places"), Some(ToolKind::Places));
    }
}
