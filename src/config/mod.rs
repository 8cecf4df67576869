//! Configuration management for Morais

pub mod session;
pub mod storage;

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::assessment::QuizDifficulty;

pub use storage::LocalStore;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "MORAIS_API_URL";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the platform API (no trailing slash)
    pub api_base_url: String,

    /// Quiz grading difficulty (sets the pass threshold)
    #[serde(default)]
    pub difficulty: QuizDifficulty,

    /// Seconds between background progress saves while changes are pending
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: u64,

    /// Language sent to the execution endpoint when a block does not name one
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Vim mode enabled
    #[serde(default = "default_vim_mode")]
    pub vim_mode: bool,
}

fn default_autosave_interval() -> u64 {
    30
}

fn default_language() -> String {
    "python".to_string()
}

fn default_vim_mode() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            difficulty: QuizDifficulty::Normal,
            autosave_interval_secs: default_autosave_interval(),
            default_language: default_language(),
            vim_mode: default_vim_mode(),
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists.
    ///
    /// `MORAIS_API_URL` overrides the stored base URL without rewriting the file.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.apply_api_url(&url);
        }

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Replace the API base URL, dropping any trailing slash
    pub fn apply_api_url(&mut self, url: &str) {
        let trimmed = url.trim().trim_end_matches('/');
        if !trimmed.is_empty() {
            self.api_base_url = trimmed.to_string();
        }
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "morais").context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "morais").context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Background save interval as a duration
    pub fn autosave_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.autosave_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_normal_difficulty() {
        let config = Config::default();
        assert_eq!(config.difficulty, QuizDifficulty::Normal);
        assert_eq!(config.autosave_interval_secs, 30);
    }

    #[test]
    fn config_deserializes_with_missing_fields() {
        let json = r#"{"api_base_url":"https://codewithmorais.com"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_base_url, "https://codewithmorais.com");
        assert_eq!(config.default_language, "python");
        assert!(config.vim_mode);
    }

    #[test]
    fn config_parses_difficulty() {
        let json = r#"{"api_base_url":"http://x","difficulty":"hard"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.difficulty, QuizDifficulty::Hard);
    }

    #[test]
    fn api_url_override_strips_trailing_slash() {
        let mut config = Config::default();
        config.apply_api_url("https://api.example.com/ ");
        assert_eq!(config.api_base_url, "https://api.example.com");

        config.apply_api_url("   ");
        assert_eq!(config.api_base_url, "https://api.example.com");
    }
}
