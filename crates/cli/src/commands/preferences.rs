//! `wayfarer preferences` — Show or set stored travel preferences.

use wayfarer_config::AppConfig;
use wayfarer_config::preferences::{load_preferences, save_preferences};

pub async fn run(set: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let path = AppConfig::preferences_path();

    match set {
        Some(text) => {
            save_preferences(&path, &text)?;
            println!("Preferences saved to {}", path.display());
        }
        None => {
            let prefs = load_preferences(&path);
            if prefs.is_empty() {
                println!("No preferences stored.");
                println!("Set them with: wayfarer preferences --set \"vegetarian, loves museums\"");
            } else {
                println!("{prefs}");
            }
        }
    }

    Ok(())
}
