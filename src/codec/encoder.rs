use crate::protocol::{Child, Property};
use crate::schema::mapping::{EncodeOutput, Mapping, Record};

/// Property name of the record's own remote identifier
pub const ENTITY_ID_KEY: &str = "_entity_id";

/// The wire form of one record instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedRecord {
    /// Value of a declared `_entity_id` field, when set
    pub entity_id: Option<String>,
    pub properties: Vec<Property>,
    pub children: Vec<Child>,
}

impl EncodedRecord {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Encode a record into ordered properties and children
pub fn encode<R: Record>(record: &R) -> EncodedRecord {
    encode_with(Mapping::<R>::cached(), record)
}

pub(crate) fn encode_with<R: Record>(mapping: &Mapping<R>, record: &R) -> EncodedRecord {
    let mut out = EncodeOutput::default();
    mapping.encode_into(record, "", &mut out);

    let entity_id = out
        .system
        .iter()
        .find(|p| p.name == ENTITY_ID_KEY && !p.value.text.is_empty())
        .map(|p| p.value.text.clone());

    EncodedRecord {
        entity_id,
        properties: out.properties,
        children: out.children,
    }
}
