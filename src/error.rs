use thiserror::Error;

use crate::config::ConfigError;

/// Error type for the entity client
#[derive(Debug, Error)]
pub enum EntityError {
    /// The caller passed something the operation cannot work with
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Errors raised while converting between record fields and property values
    #[error("Codec error: {0}")]
    Codec(String),

    /// Errors related to the shared schema registry
    #[error("Registry error: {0}")]
    Registry(String),

    /// The transport call itself failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The store answered, but reported a failure
    #[error("error {code}: {message}")]
    Remote { code: i32, message: String },

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Config files or environment could not be read
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EntityError {
    /// Build the error for a response that carried an application-level failure.
    pub fn remote(code: i32, message: impl Into<String>) -> Self {
        EntityError::Remote {
            code,
            message: message.into(),
        }
    }
}

/// Conversion from serde_json::Error to EntityError
impl From<serde_json::Error> for EntityError {
    fn from(error: serde_json::Error) -> Self {
        EntityError::Serialization(error.to_string())
    }
}

/// Result type alias for operations that can result in an EntityError
pub type EntityResult<T> = Result<T, EntityError>;
