//! Client configuration
//!
//! Handles loading the credentials and timing thresholds used by a
//! [`Connection`](crate::Connection) from TOML files and environment variables.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client label reported to the store when none is configured.
pub const DEFAULT_CLIENT_LABEL: &str = "fold-entity-rust";

/// Credentials and identity of the calling application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Vendor that owns the application
    pub vendor_id: String,
    /// Application id within the vendor
    pub app_id: String,
    /// Access token presented on every request
    pub access_token: String,
    /// Client label attached to every mutation
    pub client_label: String,
    /// Duration thresholds for RPC timing logs
    pub timing: TimingConfig,
}

/// Level thresholds for timed RPC logs, in milliseconds.
///
/// A call that takes at least `error_ms` is logged at error level, at least
/// `warn_ms` at warn level, and so on down to trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub error_ms: u64,
    pub warn_ms: u64,
    pub info_ms: u64,
    pub debug_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            vendor_id: String::new(),
            app_id: String::new(),
            access_token: String::new(),
            client_label: DEFAULT_CLIENT_LABEL.to_string(),
            timing: TimingConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            error_ms: 60_000,
            warn_ms: 30_000,
            info_ms: 2_000,
            debug_ms: 100,
        }
    }
}

impl TimingConfig {
    /// Pick the log level for a call that took `elapsed`.
    pub fn level_for(&self, elapsed: Duration) -> log::Level {
        let ms = elapsed.as_millis() as u64;
        if ms >= self.error_ms {
            log::Level::Error
        } else if ms >= self.warn_ms {
            log::Level::Warn
        } else if ms >= self.info_ms {
            log::Level::Info
        } else if ms >= self.debug_ms {
            log::Level::Debug
        } else {
            log::Level::Trace
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given application credentials
    pub fn new(vendor_id: &str, app_id: &str, access_token: &str) -> Self {
        Self {
            vendor_id: vendor_id.to_string(),
            app_id: app_id.to_string(),
            access_token: access_token.to_string(),
            ..Self::default()
        }
    }

    /// Read a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config: ClientConfig = read_toml(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults adjusted by the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Default location of the client configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fold_entity").join("client.toml"))
    }

    /// Apply `FOLD_ENTITY_*` overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(vendor_id) = std::env::var("FOLD_ENTITY_VENDOR_ID") {
            self.vendor_id = vendor_id;
        }
        if let Ok(app_id) = std::env::var("FOLD_ENTITY_APP_ID") {
            self.app_id = app_id;
        }
        if let Ok(token) = std::env::var("FOLD_ENTITY_ACCESS_TOKEN") {
            self.access_token = token;
        }
        if let Ok(label) = std::env::var("FOLD_ENTITY_CLIENT_LABEL") {
            self.client_label = label;
        }

        // Timing thresholds
        override_millis("FOLD_ENTITY_TIMING_ERROR_MS", &mut self.timing.error_ms)?;
        override_millis("FOLD_ENTITY_TIMING_WARN_MS", &mut self.timing.warn_ms)?;
        override_millis("FOLD_ENTITY_TIMING_INFO_MS", &mut self.timing.info_ms)?;
        override_millis("FOLD_ENTITY_TIMING_DEBUG_MS", &mut self.timing.debug_ms)?;

        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        write_toml(self, path)
    }

    /// Require the app identity and increasing timing thresholds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vendor_id.is_empty() {
            return Err(ConfigError::Missing("vendor_id".to_string()));
        }
        if self.app_id.is_empty() {
            return Err(ConfigError::Missing("app_id".to_string()));
        }

        let t = &self.timing;
        if !(t.debug_ms <= t.info_ms && t.info_ms <= t.warn_ms && t.warn_ms <= t.error_ms) {
            return Err(ConfigError::InvalidValue(
                "timing".to_string(),
                "thresholds must increase from debug to error".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a TOML file into `T`
pub(crate) fn read_toml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Write `value` as TOML, creating missing parent directories
pub(crate) fn write_toml<T: Serialize, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> Result<(), ConfigError> {
    let content =
        toml::to_string_pretty(value).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn override_millis(var: &str, target: &mut u64) -> Result<(), ConfigError> {
    if let Ok(raw) = std::env::var(var) {
        *target = raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw.clone()))?;
    }
    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
    #[error("Missing required setting: {0}")]
    Missing(String),
    #[error("Invalid value for '{0}': {1}")]
    InvalidValue(String, String),
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
    #[error("Invalid log level for feature '{0}': {1}")]
    InvalidFeatureLevel(String, String),
}
