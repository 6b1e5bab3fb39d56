//! Fold entity client
//!
//! Maps strongly-typed application records onto a remote, schema-flexible
//! entity store: schemas are derived from record mappings and registered once
//! per type, records are encoded into typed properties and child payloads, and
//! updates only send what changed since the record was loaded.

pub mod actor;
pub mod codec;
pub mod config;
pub mod connection;
pub mod diff;
pub mod entity;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod query;
pub mod schema;
pub mod transport;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use actor::Actor;
pub use codec::{decode, encode, ChildRecord, EncodedRecord, GenericResult};
pub use config::{ClientConfig, ConfigError, TimingConfig};
pub use connection::Connection;
pub use entity::{Entity, EntityBase, EntitySnapshot, TimeSeriesRecord};
pub use error::{EntityError, EntityResult};
pub use logging::LoggingSystem;
pub use query::{FindOption, MutateOption, RetrieveBy, RetrieveOption};
pub use schema::{
    derive_schema, Classification, DataType, Field, FieldOption, Mapping, Record, Schema,
    SchemaOption, SchemaRegistry, SyncState, TypeDefinition, TypeRegistration,
};
#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;
pub use transport::Transport;
pub use types::{Amount, IntSet, SecretString, StringSet, VerifyString};
pub use value::{FieldValue, PropertyValue};
