//! Places tool backed by OpenStreetMap.
//!
//! `search_places` geocodes a location via Nominatim, then queries the
//! Overpass API for points of interest around it. Only three categories
//! are supported — restaurant, museum, park — with fixed tag filters;
//! everything else the assistant generates from its own knowledge.

use async_trait::async_trait;
use tracing::debug;
use wayfarer_config::PlacesConfig;
use wayfarer_core::error::ToolError;
use wayfarer_core::tool::{Tool, ToolKind, ToolResult};

const TOOL_NAME: &str = "search_places";

/// Overpass tag filter per supported category.
fn category_filter(category: &str) -> Option<&'static str> {
    match category {
        "restaurant" => Some(r#"["amenity"~"restaurant|fast_food"]"#),
        "museum" => Some(r#"["tourism"~"museum|gallery"]"#),
        "park" => Some(r#"["leisure"~"park|garden"]"#),
        _ => None,
    }
}

pub struct SearchPlacesTool {
    client: reqwest::Client,
    nominatim_url: String,
    overpass_url: String,
    user_agent: String,
    search_radius_m: u32,
    max_results: usize,
}

impl SearchPlacesTool {
    pub fn new(config: &PlacesConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            nominatim_url: config.nominatim_url.clone(),
            overpass_url: config.overpass_url.clone(),
            user_agent: config.user_agent.clone(),
            search_radius_m: config.search_radius_m,
            max_results: config.max_results,
        }
    }

    /// Geocode a free-form location to (lat, lon) via Nominatim.
    async fn geocode(&self, location: &str) -> Result<(f64, f64), ToolError> {
        let response = self
            .client
            .get(&self.nominatim_url)
            .header("User-Agent", &self.user_agent)
            .query(&[("q", location), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| execution_failed(e.to_string()))?;

        if response.status().as_u16() != 200 {
            return Err(execution_failed(format!(
                "geocoding returned status {}",
                response.status().as_u16()
            )));
        }

        let results: serde_json::Value = response
            .json()
            .await
            .map_err(|e| execution_failed(format!("failed to parse geocoding response: {e}")))?;

        let first = results
            .as_array()
            .and_then(|arr| arr.first())
            .ok_or_else(|| execution_failed(format!("location not found: {location}")))?;

        let lat = first["lat"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| execution_failed("geocoding result has no latitude".into()))?;
        let lon = first["lon"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| execution_failed("geocoding result has no longitude".into()))?;

        Ok((lat, lon))
    }

    /// Query Overpass for named POIs of a category around a point.
    async fn query_pois(
        &self,
        filter: &str,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<String>, ToolError> {
        let radius = self.search_radius_m;
        let query = format!(
            "[out:json][timeout:25];\
             (node{filter}(around:{radius},{lat},{lon});\
              way{filter}(around:{radius},{lat},{lon}););\
             out center 50;"
        );

        let response = self
            .client
            .post(&self.overpass_url)
            .header("User-Agent", &self.user_agent)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(|e| execution_failed(e.to_string()))?;

        if response.status().as_u16() != 200 {
            return Err(execution_failed(format!(
                "Overpass returned status {}",
                response.status().as_u16()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| execution_failed(format!("failed to parse Overpass response: {e}")))?;

        Ok(extract_names(&body, self.max_results))
    }
}

fn execution_failed(reason: String) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: TOOL_NAME.into(),
        reason,
    }
}

/// Pull unique element names out of an Overpass response, in order.
fn extract_names(body: &serde_json::Value, limit: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for element in body["elements"].as_array().map(|a| a.as_slice()).unwrap_or_default() {
        let Some(name) = element["tags"]["name"].as_str() else {
            continue;
        };
        if names.iter().any(|n| n == name) {
            continue;
        }
        names.push(name.to_string());
        if names.len() >= limit {
            break;
        }
    }
    names
}

#[async_trait]
impl Tool for SearchPlacesTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Find points of interest near a location via OpenStreetMap. \
         Supported categories: restaurant, museum, park. Returns a list of \
         place names; other kinds of attractions are not available here."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city or area to search in"
                },
                "category": {
                    "type": "string",
                    "enum": ["restaurant", "museum", "park"],
                    "description": "Which kind of place to search for"
                }
            },
            "required": ["location", "category"]
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Places
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let location = arguments["location"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'location' argument".into()))?;
        let category = arguments["category"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'category' argument".into()))?;

        let filter = category_filter(category).ok_or_else(|| {
            ToolError::InvalidArguments(format!(
                "Unsupported category '{category}'. Supported: restaurant, museum, park."
            ))
        })?;

        let (lat, lon) = self.geocode(location).await?;
        debug!(location, category, lat, lon, "Searching places");
        let names = self.query_pois(filter, lat, lon).await?;

        let output = if names.is_empty() {
            format!("No {category} results found near {location}.")
        } else {
            let summary = serde_json::json!({
                "location": location,
                "category": category,
                "places": names,
            });
            serde_json::to_string_pretty(&summary).unwrap_or_default()
        };

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
            data: None,
        })
    }
}
