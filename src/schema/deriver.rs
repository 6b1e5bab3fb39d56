use crate::log_schema_debug;
use crate::schema::mapping::{Mapping, Record, SchemaCollector};
use crate::schema::types::{Field, Schema, SchemaOption};

/// A derived schema together with the system fields left out of it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDescription {
    pub schema: Schema,
    /// `_`-prefixed fields, populated on decode and extracted on encode
    pub system_fields: Vec<Field>,
}

/// Derive the registrable schema of a record type
pub fn derive_schema<R: Record>() -> Schema {
    describe_record::<R>().schema
}

pub fn describe_record<R: Record>() -> RecordDescription {
    let definition = R::definition();
    let mut collected = SchemaCollector::default();
    Mapping::<R>::cached().describe_into("", &mut collected);

    let mut options = definition.options;
    if !collected.child_types.is_empty() && !options.contains(&SchemaOption::ChildEntities) {
        options.push(SchemaOption::ChildEntities);
    }

    log_schema_debug!(
        "Derived schema '{}' with {} fields ({} system, {} child types)",
        definition.type_name,
        collected.fields.len(),
        collected.system_fields.len(),
        collected.child_types.len()
    );

    RecordDescription {
        schema: Schema {
            id: String::new(),
            type_name: definition.type_name,
            display_name: definition.display_name,
            singular: definition.singular,
            plural: definition.plural,
            description: definition.description,
            fields: collected.fields,
            options,
            source: None,
            child_types: collected.child_types,
        },
        system_fields: collected.system_fields,
    }
}
