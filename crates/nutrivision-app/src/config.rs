//! Configuration management for nutrivision
//!
//! Config stored at: ~/.config/nutrivision/config.json
//! The API key is read from the environment only and never written to disk.

use nutrivision_types::{ConfigError, OutputFormat, Result};
use nutrivision_vision::{
    Analyzer, AnalyzerConfig, GeminiBackend, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variables checked for the API key, in order
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Inference API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            api_base: default_api_base(),
            request_timeout_secs: default_timeout(),
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("nutrivision");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::SaveError(format!("{}: {}", parent.display(), e)))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveError(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Analyzer settings for this config plus the given credential
    pub fn analyzer_config(&self, api_key: Option<String>) -> AnalyzerConfig {
        AnalyzerConfig::default()
            .with_api_key(api_key)
            .with_model(Some(self.model.clone()))
            .with_temperature(self.temperature)
    }

    /// Build an analyzer backed by the HTTP inference service.
    ///
    /// A missing API key is not an error here; each invocation reports it.
    pub fn build_analyzer(&self) -> Result<Analyzer> {
        let backend = GeminiBackend::new(
            self.api_base.clone(),
            Duration::from_secs(self.request_timeout_secs),
        )?;
        Ok(Analyzer::new(
            Arc::new(backend),
            self.analyzer_config(api_key_from_env()),
        ))
    }
}

/// Read the API key from the process environment
pub fn api_key_from_env() -> Option<String> {
    resolve_api_key(|name| std::env::var(name).ok())
}

fn resolve_api_key(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "NutriVision Configuration")?;
        writeln!(f, "=========================")?;
        writeln!(f)?;
        writeln!(f, "Model:          {}", self.model)?;
        writeln!(f, "Temperature:    {}", self.temperature)?;
        writeln!(f, "API base:       {}", self.api_base)?;
        writeln!(f, "Timeout:        {}s", self.request_timeout_secs)?;
        writeln!(f, "Output format:  {}", self.output_format)?;
        writeln!(
            f,
            "API key:        {}",
            if api_key_from_env().is_some() {
                "(set)"
            } else {
                "(missing)"
            }
        )?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutrivision_types::Error;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"model":"gemini-2.5-pro","output_format":"json"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            temperature: 0.2,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("api_key"));
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_api_key_resolution_order() {
        let both = |name: &str| match name {
            "GEMINI_API_KEY" => Some("gemini".to_string()),
            "API_KEY" => Some("generic".to_string()),
            _ => None,
        };
        assert_eq!(resolve_api_key(both).as_deref(), Some("gemini"));

        let fallback = |name: &str| match name {
            "GEMINI_API_KEY" => Some("  ".to_string()),
            "API_KEY" => Some("generic".to_string()),
            _ => None,
        };
        assert_eq!(resolve_api_key(fallback).as_deref(), Some("generic"));
        assert_eq!(resolve_api_key(|_| None), None);
    }

    #[test]
    fn test_analyzer_config_uses_settings() {
        let config = Config {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            ..Config::default()
        };
        let analyzer_config = config.analyzer_config(Some("k".to_string()));
        assert_eq!(analyzer_config.model, "gemini-2.0-flash");
        assert_eq!(analyzer_config.temperature, 0.7);
        assert_eq!(analyzer_config.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_build_analyzer_carries_model() {
        let config = Config {
            model: "gemini-2.5-pro".to_string(),
            request_timeout_secs: 5,
            ..Config::default()
        };
        let analyzer = config.build_analyzer().unwrap();
        assert_eq!(analyzer.config().model, "gemini-2.5-pro");
        assert_eq!(analyzer.config().temperature, DEFAULT_TEMPERATURE);
    }
}
