//! # Logging
//!
//! Installs an `env_logger` backend driven by [`LogConfig`] and keeps the
//! active configuration available for runtime inspection and updates.

pub mod config;
pub mod features;

use config::{parse_level, LogConfig};
use features::LogFeature;
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Configuration the process was initialized with, updated in place
static ACTIVE_CONFIG: OnceCell<Arc<RwLock<LogConfig>>> = OnceCell::new();

pub struct LoggingSystem;

impl LoggingSystem {
    /// Initialize from defaults and `FOLD_ENTITY_LOG_*` variables
    pub async fn init_default() -> Result<(), LoggingError> {
        Self::init_with_config(LogConfig::from_env()?).await
    }

    pub async fn init_from_file(path: &str) -> Result<(), LoggingError> {
        Self::init_with_config(LogConfig::from_file(path)?).await
    }

    /// Validate `config` and install it; only the first call in a process succeeds
    pub async fn init_with_config(config: LogConfig) -> Result<(), LoggingError> {
        config.validate()?;
        let default_level = parse_level(&config.level).unwrap_or(log::LevelFilter::Info);

        ACTIVE_CONFIG
            .set(Arc::new(RwLock::new(config.clone())))
            .map_err(|_| LoggingError::AlreadyInitialized)?;

        if config.console.enabled {
            // Another logger may already be installed by the host application
            build_logger(&config, default_level).try_init().ok();
        }
        log::set_max_level(max_configured_level(&config, default_level));
        Ok(())
    }

    pub fn is_initialized() -> bool {
        ACTIVE_CONFIG.get().is_some()
    }

    pub async fn get_config() -> Option<LogConfig> {
        let config = ACTIVE_CONFIG.get()?;
        Some(config.read().await.clone())
    }

    /// Record a new level for one feature and raise the global ceiling if needed
    pub async fn update_feature_level(feature: &str, level: &str) -> Result<(), LoggingError> {
        let Some(feature) = LogFeature::from_name(feature) else {
            return Err(LoggingError::Config(format!("Unknown feature: {}", feature)));
        };
        let filter = parse_level(level)
            .ok_or_else(|| LoggingError::Config(format!("Invalid log level: {}", level)))?;
        let config = ACTIVE_CONFIG
            .get()
            .ok_or_else(|| LoggingError::Config("Logging system not initialized".to_string()))?;

        config
            .write()
            .await
            .features
            .insert(feature.name().to_string(), level.to_string());
        if filter > log::max_level() {
            log::set_max_level(filter);
        }
        Ok(())
    }

    /// Current level of every configured feature
    pub async fn get_features() -> Option<BTreeMap<String, String>> {
        let config = ACTIVE_CONFIG.get()?;
        Some(config.read().await.features.clone())
    }
}

fn build_logger(config: &LogConfig, default_level: log::LevelFilter) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    for (name, level) in &config.features {
        if let (Some(feature), Some(level)) = (LogFeature::from_name(name), parse_level(level)) {
            builder.filter_module(feature.target(), level);
        }
    }
    if !config.console.timestamps {
        builder.format_timestamp(None);
    }
    builder.format_module_path(config.console.module_path);
    builder
}

fn max_configured_level(config: &LogConfig, default_level: log::LevelFilter) -> log::LevelFilter {
    config
        .features
        .values()
        .filter_map(|level| parse_level(level))
        .fold(default_level, |max, level| max.max(level))
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logging system already initialized")]
    AlreadyInitialized,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Config error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}
