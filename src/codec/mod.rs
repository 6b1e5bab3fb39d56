//! Conversion between record instances and store properties.

pub mod child;
pub mod decoder;
pub mod encoder;
pub mod generic;

pub use child::{ChildData, ChildRecord};
pub use decoder::{decode, decode_properties, property_map};
pub use encoder::{encode, EncodedRecord, ENTITY_ID_KEY};
pub use generic::GenericResult;
