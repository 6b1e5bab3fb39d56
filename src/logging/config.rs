//! Log level settings per feature target.
//!
//! Read from a TOML file or built from defaults, then adjusted by
//! `FOLD_ENTITY_LOG_*` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{read_toml, write_toml, ConfigError};
use crate::logging::features::LogFeature;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Level for targets without a feature entry
    pub level: String,
    pub console: ConsoleOutput,
    /// Level per feature name, e.g. `registry = "DEBUG"`
    pub features: BTreeMap<String, String>,
}

/// How records are written to stderr
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleOutput {
    pub enabled: bool,
    pub timestamps: bool,
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        let features = LogFeature::ALL
            .iter()
            .map(|feature| {
                let level = match feature {
                    LogFeature::Codec => "WARN",
                    _ => "INFO",
                };
                (feature.name().to_string(), level.to_string())
            })
            .collect();

        Self {
            level: "INFO".to_string(),
            console: ConsoleOutput::default(),
            features,
        }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self {
            enabled: true,
            timestamps: true,
            module_path: true,
        }
    }
}

impl LogConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config: LogConfig = read_toml(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults adjusted by the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `FOLD_ENTITY_LOG_LEVEL`, `FOLD_ENTITY_LOG_CONSOLE` and
    /// `FOLD_ENTITY_LOG_FEATURE_<NAME>` overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(level) = std::env::var("FOLD_ENTITY_LOG_LEVEL") {
            self.level = level.to_uppercase();
        }
        if let Ok(raw) = std::env::var("FOLD_ENTITY_LOG_CONSOLE") {
            self.console.enabled = raw.parse().map_err(|_| {
                ConfigError::InvalidValue("FOLD_ENTITY_LOG_CONSOLE".to_string(), raw)
            })?;
        }

        for (key, value) in std::env::vars() {
            if let Some(feature) = key.strip_prefix("FOLD_ENTITY_LOG_FEATURE_") {
                self.features
                    .insert(feature.to_lowercase(), value.to_uppercase());
            }
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        write_toml(self, path)
    }

    /// Check every level name, including those of unknown features
    pub fn validate(&self) -> Result<(), ConfigError> {
        if parse_level(&self.level).is_none() {
            return Err(ConfigError::InvalidLevel(self.level.clone()));
        }
        if let Some((feature, level)) = self
            .features
            .iter()
            .find(|(_, level)| parse_level(level).is_none())
        {
            return Err(ConfigError::InvalidFeatureLevel(
                feature.clone(),
                level.clone(),
            ));
        }
        Ok(())
    }
}

/// Parse one of the configured level names.
pub fn parse_level(level: &str) -> Option<log::LevelFilter> {
    match level {
        "OFF" => Some(log::LevelFilter::Off),
        "TRACE" => Some(log::LevelFilter::Trace),
        "DEBUG" => Some(log::LevelFilter::Debug),
        "INFO" => Some(log::LevelFilter::Info),
        "WARN" => Some(log::LevelFilter::Warn),
        "ERROR" => Some(log::LevelFilter::Error),
        _ => None,
    }
}
