//! Configuration loading, validation, and management for Gena.
//!
//! Loads configuration from `~/.gena/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.gena/config.toml`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GenaConfig {
    /// API key for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override for an OpenAI-compatible endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Completions allowed per question before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Backoff for rate-limited requests
    #[serde(default)]
    pub retry: RetryConfig,

    /// Persist the conversation to this JSONL file instead of memory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_file: Option<PathBuf>,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_system_prompt() -> String {
    "You are a sarcastic assistant that can answer questions about the time and do math. \
     Never answer in a serious tone, always joke sarcastically."
        .into()
}
fn default_temperature() -> f32 {
    0.6
}
fn default_max_iterations() -> u32 {
    64
}

/// Rate-limit retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_initial_delay_ms() -> u64 {
    1_000
}
fn default_multiplier() -> f64 {
    1.5
}
fn default_max_delay_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for GenaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_iterations", &self.max_iterations)
            .field("retry", &self.retry)
            .field("thread_file", &self.thread_file)
            .finish()
    }
}

impl GenaConfig {
    /// Load configuration from the default path (~/.gena/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `GENA_API_KEY`, then `OPENAI_API_KEY`, then `OPENAI_KEY`
    /// - `GENA_API_URL`
    /// - `GENA_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
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

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GENA_API_KEY")
            .or_else(|| non_empty("OPENAI_API_KEY"))
            .or_else(|| non_empty("OPENAI_KEY"))
        {
            self.api_key = Some(key);
        }

        if let Some(url) = non_empty("GENA_API_URL") {
            self.api_url = Some(url);
        }

        if let Some(model) = non_empty("GENA_MODEL") {
            self.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".gena")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::ValidationError(
                "retry.multiplier must be at least 1.0".into(),
            ));
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for GenaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            model: default_model(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: None,
            max_iterations: default_max_iterations(),
            retry: RetryConfig::default(),
            thread_file: None,
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
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = GenaConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.6);
        assert_eq!(config.max_iterations, 64);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = GenaConfig {
            api_url: Some("http://localhost:11434/v1".into()),
            max_tokens: Some(512),
            thread_file: Some(PathBuf::from("/tmp/thread.jsonl")),
            ..GenaConfig::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: GenaConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = \"gpt-4o\"\n[retry]\nmax_attempts = 2\n").unwrap();

        let config = GenaConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.initial_delay_ms, 1_000);
        assert_eq!(config.max_iterations, 64);
    }

    #[test]
    fn invalid_values_rejected() {
        let bad = [
            GenaConfig {
                temperature: 5.0,
                ..GenaConfig::default()
            },
            GenaConfig {
                max_iterations: 0,
                ..GenaConfig::default()
            },
            GenaConfig {
                retry: RetryConfig {
                    multiplier: 0.5,
                    ..RetryConfig::default()
                },
                ..GenaConfig::default()
            },
            GenaConfig {
                retry: RetryConfig {
                    max_attempts: 0,
                    ..RetryConfig::default()
                },
                ..GenaConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?} should be invalid");
        }
    }

    #[test]
    fn invalid_file_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "temperature = 3.5\n").unwrap();
        assert!(matches!(
            GenaConfig::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn unparsable_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [unterminated").unwrap();
        assert!(matches!(
            GenaConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = GenaConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config, GenaConfig::default());
    }

    #[test]
    fn env_overrides_file() {
        let mut config = GenaConfig {
            api_key: Some("from-file".into()),
            ..GenaConfig::default()
        };
        config.apply_env(env(&[
            ("OPENAI_KEY", "sk-legacy"),
            ("GENA_MODEL", "gpt-4o"),
            ("GENA_API_URL", "http://localhost:8080/v1"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-legacy"));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn env_key_precedence() {
        let mut config = GenaConfig::default();
        config.apply_env(env(&[
            ("GENA_API_KEY", "sk-gena"),
            ("OPENAI_API_KEY", "sk-openai"),
            ("OPENAI_KEY", "sk-legacy"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-gena"));

        let mut config = GenaConfig::default();
        config.apply_env(env(&[("GENA_API_KEY", ""), ("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = GenaConfig {
            api_key: Some("sk-secret-123".into()),
            ..GenaConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret-123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = GenaConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("[retry]"));
        assert!(!toml_str.contains("api_key"));
    }
}
