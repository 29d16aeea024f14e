//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fallback API endpoint when neither flag, env nor config file sets one
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API endpoint URL
    pub api_url: Option<String>,
    /// Events file for local analysis
    pub events_path: Option<String>,
}

impl Config {
    /// Load configuration from the default file, if present
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Resolve the API URL: explicit value, then config file, then default
    pub fn api_url(&self, explicit: Option<String>) -> String {
        explicit
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Resolve the events file: explicit value, then config file
    pub fn events_path(&self, explicit: Option<String>) -> Option<String> {
        explicit.or_else(|| self.events_path.clone())
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("ta").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.api_url(None), DEFAULT_API_URL);
        assert_eq!(config.events_path(None), None);
    }

    #[test]
    fn test_explicit_values_win() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"api_url":"http://analytics:9000","events_path":"/data/events.jsonl"}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url(None), "http://analytics:9000");
        assert_eq!(config.api_url(Some("http://other".to_string())), "http://other");
        assert_eq!(config.events_path(None).as_deref(), Some("/data/events.jsonl"));
    }
}
