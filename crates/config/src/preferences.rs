//! User travel preferences — a small local text file.
//!
//! The content is free-form ("vegetarian, loves museums, no nightlife")
//! and is merged into the system prompt when present so trip planning can
//! be personalized.

use std::io;
use std::path::Path;

/// Load user preferences from the given path.
///
/// Returns an empty string if the file does not exist or cannot be read;
/// a missing preferences file is a normal first-run state, not an error.
pub fn load_preferences(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content.trim().to_string(),
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read preferences");
            }
            String::new()
        }
    }
}

/// Save user preferences to the given path, creating parent directories.
pub fn save_preferences(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.txt");
        assert_eq!(load_preferences(&path), "");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.txt");
        save_preferences(&path, "  vegetarian, likes jazz bars \n").unwrap();
        assert_eq!(load_preferences(&path), "vegetarian, likes jazz bars");
    }

    #[test]
    fn save_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.txt");
        save_preferences(&path, "old").unwrap();
        save_preferences(&path, "new").unwrap();
        assert_eq!(load_preferences(&path), "new");
    }
}
