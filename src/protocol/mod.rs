//! Logical request and response shapes exchanged with the entity store.
//!
//! These types describe what crosses the transport boundary; framing and
//! encoding on the wire are left to the [`Transport`](crate::Transport)
//! implementation.

mod entity;

pub use entity::{
    Child, EntityCounts, EntityDetails, Event, Label, Link, LockInfo, LogEntry, LogLevel,
    ModifyType, Property, Relationship, SensorMeasurement,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EntityError, EntityResult};
use crate::schema::Schema;
use crate::value::PropertyValue;

/// Identifies the application that owns a schema or relationship type
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorApp {
    pub vendor_id: String,
    pub app_id: String,
}

impl VendorApp {
    pub fn new(vendor_id: &str, app_id: &str) -> Self {
        Self {
            vendor_id: vendor_id.to_string(),
            app_id: app_id.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vendor_id.is_empty() && self.app_id.is_empty()
    }
}

/// Credentials and workspace scope carried by every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub vendor_id: String,
    pub app_id: String,
    pub access_token: String,
    pub workspace_id: String,
}

impl Authorization {
    pub fn source(&self) -> VendorApp {
        VendorApp::new(&self.vendor_id, &self.app_id)
    }
}

/// A key optionally scoped to an owning application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaKey {
    pub key: String,
    pub source: Option<VendorApp>,
}

impl SchemaKey {
    pub fn new(key: &str, source: Option<VendorApp>) -> Self {
        Self {
            key: key.to_string(),
            source,
        }
    }
}

/// The caller on whose behalf a write is made
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutator {
    pub user_id: String,
    pub remote_ip: String,
    pub user_agent: String,
    pub client: String,
}

/// One write against one entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub properties: Vec<Property>,
    pub remove_properties: Vec<String>,
    pub dynamic_properties: Vec<Property>,
    pub remove_dynamic_properties: Vec<String>,
    pub children: Vec<Child>,
    pub remove_children: Vec<String>,
    pub relationships: Vec<Relationship>,
    pub labels: Vec<Label>,
    pub remove_labels: Vec<String>,
    pub links: Vec<Link>,
    pub events: Vec<Event>,
    pub logs: Vec<LogEntry>,
    pub measurements: Vec<SensorMeasurement>,
    pub comment: String,
    pub mutator: Mutator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefineSchemaRequest {
    pub authorization: Authorization,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutateRequest {
    pub authorization: Authorization,
    pub entity_id: Option<String>,
    pub schema: Option<SchemaKey>,
    pub mutation: Mutation,
    /// Unique properties used to match an existing entity on conflict
    pub conflict_unique_properties: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutateResponse {
    pub success: bool,
    pub entity_id: String,
    pub error_code: i32,
    pub error_message: String,
}

impl MutateResponse {
    /// Convert an application-level failure into an error
    pub fn check(&self) -> EntityResult<()> {
        if self.error_code > 0 || !self.error_message.is_empty() {
            return Err(EntityError::remote(self.error_code, &self.error_message));
        }
        Ok(())
    }
}

/// How a single entity is addressed on retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityLocator {
    ById(String),
    ByUnique {
        /// Schema id, or the type name while the schema is unregistered
        schema_id: String,
        property: String,
        value: String,
    },
}

/// A group of properties to load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRequest {
    pub properties: Vec<String>,
    pub decrypt: bool,
    pub source: Option<VendorApp>,
}

/// Children of one type to load, optionally limited to some ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRequest {
    pub type_name: String,
    pub ids: Vec<String>,
}

/// Ask the store to lock the entity while it is being worked on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequest {
    pub duration_seconds: u32,
    pub message: String,
}

/// What parts of an entity a read should return
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    pub name: String,
    pub properties: Vec<PropertyRequest>,
    pub relationships: Vec<SchemaKey>,
    pub labels: bool,
    pub links: bool,
    pub children: Vec<ChildRequest>,
    pub summary: bool,
    pub datum: bool,
    pub relationship_count: bool,
    pub relationship_count_types: Vec<SchemaKey>,
    pub child_count: bool,
    pub descendant_count_types: Vec<SchemaKey>,
    pub dynamic_properties: Vec<String>,
    pub lock: Option<LockRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub authorization: Authorization,
    pub locator: EntityLocator,
    pub schema: Option<SchemaKey>,
    pub view: EntityView,
}

/// One entity as returned by the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityResponse {
    pub entity_id: String,
    pub schema: String,
    pub properties: Vec<Property>,
    pub dynamic_properties: Vec<Property>,
    pub children: Vec<Child>,
    pub labels: Vec<Label>,
    pub links: Vec<Link>,
    pub relationships: Vec<Relationship>,
    pub details: EntityDetails,
    pub counts: EntityCounts,
    pub lock: Option<LockInfo>,
}

impl EntityResponse {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// Comparison applied by a property filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    Between,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub property: String,
    pub operator: Operator,
    pub values: Vec<PropertyValue>,
}

/// Restrict results to entities related to (or from) another entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationFilter {
    pub source_id: String,
    pub destination_id: String,
    pub relationship: SchemaKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub property: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub per_page: u32,
    pub page_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindRequest {
    pub authorization: Authorization,
    pub schema: SchemaKey,
    pub view: EntityView,
    pub filters: Vec<PropertyFilter>,
    pub labels: Vec<Label>,
    pub relation: Option<RelationFilter>,
    pub parent_entity_id: Option<String>,
    pub sort: Vec<Sort>,
    pub page: Option<Page>,
}

impl FindRequest {
    pub fn new(authorization: Authorization, schema: SchemaKey) -> Self {
        Self {
            authorization,
            schema,
            view: EntityView::default(),
            filters: Vec::new(),
            labels: Vec::new(),
            relation: None,
            parent_entity_id: None,
            sort: Vec::new(),
            page: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindResponse {
    pub entities: Vec<EntityResponse>,
}

/// Point-in-time write recorded against the entity's time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTimeSeriesRequest {
    pub authorization: Authorization,
    pub entity_id: Option<String>,
    pub schema: SchemaKey,
    pub mutation: Mutation,
    pub timestamp: DateTime<Utc>,
}

/// Read the members of a named active set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    pub authorization: Authorization,
    pub schema: SchemaKey,
    pub from_view: String,
    /// Properties to return; empty returns all of them
    pub properties: Vec<String>,
    pub filters: Vec<PropertyFilter>,
    pub sort: Vec<Sort>,
    pub page: Option<Page>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    pub entities: Vec<EntityResponse>,
}
