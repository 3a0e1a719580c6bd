use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::chat::MissingAnswerPolicy;

pub const ENDPOINT_ENV: &str = "CHATLINE_ENDPOINT";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub missing_answer: MissingAnswerPolicy,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Initial endpoint: command line, then environment, then config file
    pub fn resolve_endpoint(&self, cli_url: Option<&str>, env_url: Option<String>) -> String {
        cli_url
            .map(str::to_string)
            .or(env_url.filter(|url| !url.is_empty()))
            .or_else(|| self.endpoint_url.clone())
            .unwrap_or_default()
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("chatline").join("config.json"))
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
        assert_eq!(config, Config::new());
        assert_eq!(config.missing_answer, MissingAnswerPolicy::Empty);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            endpoint_url: Some("http://localhost:8000/chat".to_string()),
            missing_answer: MissingAnswerPolicy::Fail,
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, config);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"missing_answer\": \"fail\""));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"endpoint_url":"http://x/chat"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.endpoint_url.as_deref(), Some("http://x/chat"));
        assert_eq!(config.missing_answer, MissingAnswerPolicy::Empty);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_endpoint_precedence() {
        let config = Config {
            endpoint_url: Some("http://config".to_string()),
            ..Config::new()
        };

        assert_eq!(
            config.resolve_endpoint(Some("http://cli"), Some("http://env".to_string())),
            "http://cli"
        );
        assert_eq!(
            config.resolve_endpoint(None, Some("http://env".to_string())),
            "http://env"
        );
        assert_eq!(config.resolve_endpoint(None, Some(String::new())), "http://config");
        assert_eq!(config.resolve_endpoint(None, None), "http://config");
        assert_eq!(Config::new().resolve_endpoint(None, None), "");
    }
}
