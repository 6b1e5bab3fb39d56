//! Schema derivation from record mappings and the shared schema registry.

pub mod deriver;
pub mod field_options;
pub mod mapping;
pub mod registry;
pub mod types;

pub use deriver::{derive_schema, describe_record, RecordDescription};
pub use field_options::{snake_case, FieldOptions};
pub use mapping::{Mapping, Record};
pub use registry::{RegistryEntry, SchemaRegistry, SyncState, TypeRegistration};
pub use types::{
    Classification, DataType, Field, FieldOption, Schema, SchemaOption, TypeDefinition,
};
