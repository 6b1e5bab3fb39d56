use std::collections::HashMap;

use crate::codec::encoder::ENTITY_ID_KEY;
use crate::protocol::{Child, EntityResponse};
use crate::schema::mapping::{DecodeInput, Mapping, Record};
use crate::value::PropertyValue;

pub const CREATED_KEY: &str = "_created";
pub const STATE_KEY: &str = "_state";
pub const STATE_CHANGE_KEY: &str = "_state_change";
pub const LAST_UPDATE_KEY: &str = "_last_update";
pub const SCHEMA_KEY: &str = "_schema";
pub const RELATIONSHIP_COUNT_KEY: &str = "_relationship_count";
pub const CHILD_COUNT_KEY: &str = "_child_count";
pub const DESCENDANT_COUNT_KEY: &str = "_descendant_count";

/// Flatten a response into a name → value map, including the read-only
/// metadata pseudo-properties
pub fn property_map(response: &EntityResponse) -> HashMap<String, PropertyValue> {
    let mut map = HashMap::with_capacity(response.properties.len() + 8);
    map.insert(
        ENTITY_ID_KEY.to_string(),
        PropertyValue::text(response.entity_id.clone()),
    );
    if !response.schema.is_empty() {
        map.insert(SCHEMA_KEY.to_string(), PropertyValue::text(response.schema.clone()));
    }

    let details = &response.details;
    if let Some(created) = details.created {
        map.insert(CREATED_KEY.to_string(), PropertyValue::time(created));
    }
    if !details.state.is_empty() {
        map.insert(STATE_KEY.to_string(), PropertyValue::text(details.state.clone()));
    }
    if let Some(changed) = details.state_change {
        map.insert(STATE_CHANGE_KEY.to_string(), PropertyValue::time(changed));
    }
    if let Some(updated) = details.last_update {
        map.insert(LAST_UPDATE_KEY.to_string(), PropertyValue::time(updated));
    }

    let counts = &response.counts;
    map.insert(
        RELATIONSHIP_COUNT_KEY.to_string(),
        PropertyValue::int(counts.total_relationships),
    );
    map.insert(CHILD_COUNT_KEY.to_string(), PropertyValue::int(counts.children));
    for (relationship, count) in &counts.relationships {
        map.insert(
            format!("{}.{}", RELATIONSHIP_COUNT_KEY, relationship),
            PropertyValue::int(*count),
        );
    }
    for (entity_type, count) in &counts.descendants {
        map.insert(
            format!("{}.{}", DESCENDANT_COUNT_KEY, entity_type),
            PropertyValue::int(*count),
        );
    }

    for property in &response.properties {
        map.insert(property.name.clone(), property.value.clone());
    }
    map
}

/// Populate `record` from a store response.
///
/// Properties that are absent leave their fields untouched.
pub fn decode<R: Record>(response: &EntityResponse, record: &mut R) {
    let properties = property_map(response);
    decode_properties(&properties, &response.children, record);
}

/// Populate `record` from a property map and child payloads
pub fn decode_properties<R: Record>(
    properties: &HashMap<String, PropertyValue>,
    children: &[Child],
    record: &mut R,
) {
    let input = DecodeInput {
        properties,
        children,
    };
    Mapping::<R>::cached().decode_from(record, "", &input);
}
