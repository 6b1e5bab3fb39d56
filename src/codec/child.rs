use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{EntityError, EntityResult};

/// Serialized payload of one child record, keyed by field name
pub type ChildData = BTreeMap<String, Vec<u8>>;

/// An element of a repeated child collection such as order line items.
///
/// By default every serialized field is stored independently as JSON. Types
/// with their own storage layout override [`to_child_data`](Self::to_child_data)
/// and [`from_child_data`](Self::from_child_data).
pub trait ChildRecord: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Store-assigned id of this child, empty for new children
    fn child_id(&self) -> String {
        String::new()
    }

    fn set_child_id(&mut self, _id: &str) {}

    /// Numeric value the store aggregates across children
    fn aggregate_value(&self) -> Option<i64> {
        None
    }

    fn set_aggregate_value(&mut self, _value: i64) {}

    fn to_child_data(&self) -> EntityResult<ChildData> {
        generic_child_data(self)
    }

    fn from_child_data(data: &ChildData) -> EntityResult<Self> {
        generic_from_child_data(data)
    }
}

/// Serialize each top-level field of `value` to its own JSON payload
pub fn generic_child_data<T: Serialize>(value: &T) -> EntityResult<ChildData> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => {
            let mut data = ChildData::new();
            for (name, field) in fields {
                data.insert(name, serde_json::to_vec(&field)?);
            }
            Ok(data)
        }
        other => Err(EntityError::Codec(format!(
            "child records must serialize to an object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Inverse of [`generic_child_data`]; keys the type does not know are ignored
/// by serde unless the type denies unknown fields
pub fn generic_from_child_data<T: DeserializeOwned>(data: &ChildData) -> EntityResult<T> {
    let mut fields = Map::new();
    for (name, raw) in data {
        fields.insert(name.clone(), serde_json::from_slice(raw)?);
    }
    Ok(serde_json::from_value(Value::Object(fields))?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
