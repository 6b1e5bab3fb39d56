use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::codec::decoder::property_map;
use crate::protocol::EntityResponse;

/// An entity decoded without a record type: property name to JSON value.
///
/// Empty values are left out, so only properties carrying data appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenericResult {
    pub entity_id: String,
    pub values: BTreeMap<String, Value>,
}

impl GenericResult {
    pub fn from_response(response: &EntityResponse) -> Self {
        let values = property_map(response)
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name, value.to_json()))
            .collect();

        Self {
            entity_id: response.entity_id.clone(),
            values,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
