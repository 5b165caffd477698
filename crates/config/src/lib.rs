//! Configuration loading and validation for ConsoleChat.
//!
//! Loads configuration from `~/.consolechat/config.toml` with
//! environment variable overrides. Validates all settings at startup.
//! The loaded value is passed by ownership into the components that
//! need it — there is no global configuration holder.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.consolechat/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the pretrained model directory. Must be set before the
    /// first chat; `onboard` writes an empty placeholder.
    #[serde(default)]
    pub model_path: String,

    /// Maximum number of tokens to send to the model at once. The
    /// backend may enforce a lower model-specific limit.
    #[serde(default = "default_max_input_length")]
    pub max_input_length: u32,

    /// Maximum number of tokens to generate per response.
    #[serde(default = "default_max_output_length")]
    pub max_output_length: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Initial prompt, prepended before all history on every turn.
    #[serde(default = "default_initializer")]
    pub initializer: String,

    /// Display label for user messages (rendered verbatim, so include
    /// any trailing separator you want the model to see).
    #[serde(default = "default_user_label")]
    pub user_label: String,

    /// Display label for assistant messages; also the generation
    /// marker appended to every transmitted window.
    #[serde(default = "default_assistant_label")]
    pub assistant_label: String,

    /// Backend process configuration.
    #[serde(default)]
    pub backend: BackendConfig,
}

fn default_max_input_length() -> u32 {
    1024
}
fn default_max_output_length() -> u32 {
    1024
}
fn default_temperature() -> f32 {
    0.7
}
fn default_initializer() -> String {
    "You are ConsoleChat. You are an AI that can talk to people through \
     a terminal. You are talking to a user through a terminal."
        .into()
}
fn default_user_label() -> String {
    "User: ".into()
}
fn default_assistant_label() -> String {
    "Assistant: ".into()
}

/// Configuration for the spawned generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Host the backend binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the backend listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Interpreter used to launch the backend script.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Path to the backend script.
    #[serde(default = "default_script")]
    pub script: String,

    /// Bounded wait for each request/reply exchange. A backend that
    /// does not answer within this window is treated as dead.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How many times to retry the initial connect before declaring
    /// startup failure.
    #[serde(default = "default_startup_max_attempts")]
    pub startup_max_attempts: u32,

    /// Delay between connect attempts.
    #[serde(default = "default_startup_backoff_ms")]
    pub startup_backoff_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}
fn default_interpreter() -> String {
    "python3".into()
}
fn default_script() -> String {
    "model.py".into()
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_startup_max_attempts() -> u32 {
    20
}
fn default_startup_backoff_ms() -> u64 {
    500
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            interpreter: default_interpreter(),
            script: default_script(),
            request_timeout_secs: default_request_timeout_secs(),
            startup_max_attempts: default_startup_max_attempts(),
            startup_backoff_ms: default_startup_backoff_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            max_input_length: default_max_input_length(),
            max_output_length: default_max_output_length(),
            temperature: default_temperature(),
            initializer: default_initializer(),
            user_label: default_user_label(),
            assistant_label: default_assistant_label(),
            backend: BackendConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path
    /// (`~/.consolechat/config.toml`).
    ///
    /// Environment variable overrides (highest priority):
    /// - `CONSOLECHAT_MODEL_PATH`
    /// - `CONSOLECHAT_BACKEND_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;

        if let Ok(path) = std::env::var("CONSOLECHAT_MODEL_PATH") {
            config.model_path = path;
        }
        if let Ok(port) = std::env::var("CONSOLECHAT_BACKEND_PORT") {
            config.backend.port = port.parse().map_err(|_| {
                ConfigError::Validation(format!(
                    "CONSOLECHAT_BACKEND_PORT is not a valid port: {port}"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".consolechat")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.max_input_length == 0 || self.max_output_length == 0 {
            return Err(ConfigError::Validation(
                "max_input_length and max_output_length must be nonzero".into(),
            ));
        }
        if self.user_label.is_empty() || self.assistant_label.is_empty() {
            return Err(ConfigError::Validation(
                "user_label and assistant_label must not be empty".into(),
            ));
        }
        if self.backend.startup_max_attempts == 0 {
            return Err(ConfigError::Validation(
                "backend.startup_max_attempts must be at least 1".into(),
            ));
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "backend.request_timeout_secs must be nonzero".into(),
            ));
        }
        Ok(())
    }

    /// Generate the default config TOML string (for `onboard`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
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
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    Validation(String),
}
