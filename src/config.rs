//! Runtime configuration.
//!
//! Resolution order: built-in defaults, then an optional JSON file named by
//! `CARDIOCARE_CONFIG`, then individual `CARDIOCARE_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::ModelSpec;
use crate::domain::FeatureLayout;

pub const ENV_CONFIG: &str = "CARDIOCARE_CONFIG";
pub const ENV_MODEL_PATH: &str = "CARDIOCARE_MODEL_PATH";
pub const ENV_MODEL_SHA256: &str = "CARDIOCARE_MODEL_SHA256";
pub const ENV_FEATURE_LAYOUT: &str = "CARDIOCARE_FEATURE_LAYOUT";
pub const ENV_MODEL_LOAD_TIMEOUT_MS: &str = "CARDIOCARE_MODEL_LOAD_TIMEOUT_MS";
pub const ENV_EXPORT_DIR: &str = "CARDIOCARE_EXPORT_DIR";
pub const ENV_LOG_MODE: &str = "CARDIOCARE_LOG_MODE";
pub const ENV_LOG_FILE: &str = "CARDIOCARE_LOG_FILE";

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise
    #[default]
    Auto,
    File,
    Stdout,
}

impl std::str::FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            other => Err(format!("unknown log mode '{other}' (expected auto, file or stdout)")),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model_path: PathBuf,
    /// Optional SHA-256 pin (hex) for the model artifact
    pub model_sha256: Option<String>,
    pub feature_layout: FeatureLayout,
    pub model_load_timeout_ms: u64,
    pub export_dir: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/heart_model.json"),
            model_sha256: None,
            feature_layout: FeatureLayout::Standard,
            model_load_timeout_ms: 5_000,
            export_dir: PathBuf::from("reports"),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("cardiocare.log"),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if the config file or any variable is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` in place of the environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if the config file or any variable is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_CONFIG).filter(|v| !v.trim().is_empty()) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns `ConfigError::Read` or `ConfigError::Parse`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_MODEL_PATH) {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_MODEL_SHA256) {
            self.model_sha256 = Some(v.trim().to_ascii_lowercase());
        }
        if let Some(v) = get(ENV_FEATURE_LAYOUT) {
            self.feature_layout = v.parse().map_err(|message| ConfigError::InvalidValue {
                key: ENV_FEATURE_LAYOUT,
                message,
            })?;
        }
        if let Some(v) = get(ENV_MODEL_LOAD_TIMEOUT_MS) {
            self.model_load_timeout_ms =
                v.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: ENV_MODEL_LOAD_TIMEOUT_MS,
                        message: e.to_string(),
                    })?;
        }
        if let Some(v) = get(ENV_EXPORT_DIR) {
            self.export_dir = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_LOG_MODE) {
            self.log_mode = v.parse().map_err(|message| ConfigError::InvalidValue {
                key: ENV_LOG_MODE,
                message,
            })?;
        }
        if let Some(v) = get(ENV_LOG_FILE) {
            self.log_file = PathBuf::from(v);
        }
        Ok(())
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_load_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_MODEL_LOAD_TIMEOUT_MS,
                message: "must be greater than zero".to_string(),
            });
        }
        if let Some(digest) = &self.model_sha256 {
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::InvalidValue {
                    key: ENV_MODEL_SHA256,
                    message: "expected 64 hex characters".to_string(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn model_load_timeout(&self) -> Duration {
        Duration::from_millis(self.model_load_timeout_ms)
    }

    /// Model loading parameters derived from this configuration.
    #[must_use]
    pub fn model_spec(&self) -> ModelSpec {
        let spec = ModelSpec::new(&self.model_path, self.feature_layout)
            .with_load_timeout(self.model_load_timeout());
        match &self.model_sha256 {
            Some(digest) => spec.with_sha256(digest.clone()),
            None => spec,
        }
    }
}
