//! `wayfarer doctor` — Diagnose configuration health.

use wayfarer_config::AppConfig;
use wayfarer_config::preferences::load_preferences;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Wayfarer Doctor — Configuration Diagnostics");
    println!("===========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    let config = match AppConfig::load() {
        Ok(config) => {
            if config_path.exists() {
                println!("  [ok] Config file valid ({})", config_path.display());
            } else {
                println!("  [ok] No config file — using defaults");
            }
            config
        }
        Err(e) => {
            println!("  [!!] Config file invalid: {e}");
            issues += 1;
            AppConfig::default()
        }
    };

    if config.api_key.is_some() {
        println!("  [ok] LLM API key configured");
    } else {
        println!("  [!!] No LLM API key — set OPENAI_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    if config.weather.api_key.is_some() {
        println!("  [ok] OpenWeather API key configured");
    } else {
        println!("  [!!] No OpenWeather API key — set OPENWEATHER_API_KEY; weather tools will fail");
        issues += 1;
    }

    println!(
        "  [ok] Provider: {} / model: {}",
        config.default_provider, config.default_model
    );

    let prefs = load_preferences(&AppConfig::preferences_path());
    if prefs.is_empty() {
        println!("  [--] No travel preferences stored (chat will ask on first run)");
    } else {
        println!("  [ok] Travel preferences stored");
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
