//! Entity-level payloads shared by requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::protocol::VendorApp;
use crate::value::PropertyValue;

/// How a property value is applied to the stored value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifyType {
    #[default]
    Set,
    /// Add the set/map members to the stored collection
    Append,
    /// Remove the set/map members from the stored collection
    Reduce,
}

/// A named, typed value exchanged with the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
    #[serde(default)]
    pub modify: ModifyType,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
            modify: ModifyType::Set,
        }
    }

    pub fn append(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            modify: ModifyType::Append,
            ..Self::new(name, value)
        }
    }

    pub fn reduce(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            modify: ModifyType::Reduce,
            ..Self::new(name, value)
        }
    }
}

/// A nested repeated record stored as an opaque keyed payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub type_name: String,
    pub child_id: String,
    pub aggregate_value: Option<i64>,
    pub data: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub type_name: String,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub relationship: String,
    /// Owning app of the relationship type, `None` for the caller's own app
    pub source: Option<VendorApp>,
    pub target_id: String,
    pub data: BTreeMap<String, String>,
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub type_name: String,
    pub time: DateTime<Utc>,
    pub data: BTreeMap<String, String>,
}

/// Severity of an entity log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Notice,
    Warn,
    Error,
    Critical,
    Alert,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub reference: String,
    pub actor: String,
    pub trace_id: String,
    pub time: DateTime<Utc>,
    pub data: BTreeMap<String, String>,
}

/// Read-only entity metadata returned by the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDetails {
    pub created: Option<DateTime<Utc>>,
    pub state: String,
    pub state_change: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
}

/// Counters requested through the entity view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub total_relationships: i64,
    pub relationships: BTreeMap<String, i64>,
    pub children: i64,
    pub descendants: BTreeMap<String, i64>,
}

/// A reading attached to an entity at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorMeasurement {
    pub sensor: String,
    pub value: f32,
    pub at: DateTime<Utc>,
    pub data: BTreeMap<String, String>,
}

/// Outcome of a lock requested alongside a read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub id: String,
    pub locked_until: DateTime<Utc>,
    pub message: String,
    pub lock_acquired: bool,
}
