//! Log targets per component, their macros, and the RPC timer
//!
//! Every component logs under its own target so output can be filtered per
//! feature, e.g. `RUST_LOG=fold_entity::registry=debug`.

use std::time::{Duration, Instant};

use crate::config::TimingConfig;

/// Component whose log records share a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFeature {
    Schema,
    Codec,
    Registry,
    Query,
    Transport,
    Actor,
}

impl LogFeature {
    pub const ALL: [LogFeature; 6] = [
        LogFeature::Schema,
        LogFeature::Codec,
        LogFeature::Registry,
        LogFeature::Query,
        LogFeature::Transport,
        LogFeature::Actor,
    ];

    /// Name used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            LogFeature::Schema => "schema",
            LogFeature::Codec => "codec",
            LogFeature::Registry => "registry",
            LogFeature::Query => "query",
            LogFeature::Transport => "transport",
            LogFeature::Actor => "actor",
        }
    }

    /// `log` target of this component
    pub fn target(&self) -> &'static str {
        match self {
            LogFeature::Schema => "fold_entity::schema",
            LogFeature::Codec => "fold_entity::codec",
            LogFeature::Registry => "fold_entity::registry",
            LogFeature::Query => "fold_entity::query",
            LogFeature::Transport => "fold_entity::transport",
            LogFeature::Actor => "fold_entity::actor",
        }
    }

    /// Look a feature up by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.name() == name)
    }
}

// schema
#[macro_export]
macro_rules! log_schema_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "fold_entity::schema", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_schema_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "fold_entity::schema", $($arg)*)
    };
}

// codec
#[macro_export]
macro_rules! log_codec_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "fold_entity::codec", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_codec_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "fold_entity::codec", $($arg)*)
    };
}

// registry
#[macro_export]
macro_rules! log_registry_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "fold_entity::registry", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_registry_info {
    ($($arg:tt)*) => {
        log::info!(target: "fold_entity::registry", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_registry_error {
    ($($arg:tt)*) => {
        log::error!(target: "fold_entity::registry", $($arg)*)
    };
}

// query
#[macro_export]
macro_rules! log_query_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "fold_entity::query", $($arg)*)
    };
}

// actor
#[macro_export]
macro_rules! log_actor_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "fold_entity::actor", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_actor_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "fold_entity::actor", $($arg)*)
    };
}

/// Times one operation and logs its duration at a level graded by
/// [`TimingConfig`] thresholds.
pub struct PerformanceTimer {
    start: Instant,
    feature: LogFeature,
    operation: String,
    timing: TimingConfig,
}

impl PerformanceTimer {
    pub fn new(feature: LogFeature, operation: String) -> Self {
        log::trace!(target: feature.target(), "Starting timed operation: {}", operation);
        Self {
            start: Instant::now(),
            feature,
            operation,
            timing: TimingConfig::default(),
        }
    }

    /// Use custom thresholds instead of the defaults
    pub fn with_timing(mut self, timing: &TimingConfig) -> Self {
        self.timing = timing.clone();
        self
    }

    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        let level = self.timing.level_for(duration);
        log::log!(
            target: self.feature.target(),
            level,
            "Operation '{}' completed in {:?}",
            self.operation,
            duration
        );
        duration
    }
}
