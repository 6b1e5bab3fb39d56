use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::codec::decoder::property_map;
use crate::protocol::{
    Child, EntityCounts, EntityDetails, EntityResponse, Event, Label, Link, LockInfo, LogEntry,
    LogLevel, Relationship, SensorMeasurement, VendorApp,
};
use crate::value::PropertyValue;

/// The raw state last read from the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySnapshot {
    pub properties: HashMap<String, PropertyValue>,
    pub children: Vec<Child>,
}

/// Entity state kept next to a record's own fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityBase {
    pub entity_id: String,
    labels: Vec<Label>,
    remove_labels: Vec<String>,
    links: Vec<Link>,
    relationships: Vec<Relationship>,
    events: Vec<Event>,
    logs: Vec<LogEntry>,
    measurements: Vec<SensorMeasurement>,
    remove_properties: Vec<String>,
    remove_children: Vec<String>,
    snapshot: Option<EntitySnapshot>,
    details: EntityDetails,
    counts: EntityCounts,
    lock: Option<LockInfo>,
}

impl EntityBase {
    pub fn with_id(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            ..Self::default()
        }
    }

    pub fn add_label(&mut self, name: &str, value: &str) {
        self.labels.push(Label {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    pub fn remove_label(&mut self, name: &str) {
        self.labels.retain(|label| label.name != name);
        self.remove_labels.push(name.to_string());
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn add_link(&mut self, type_name: &str, name: &str, location: &str) {
        self.links.push(Link {
            type_name: type_name.to_string(),
            name: name.to_string(),
            location: location.to_string(),
        });
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Relate this entity to `target_id` under a relationship type owned by
    /// the caller's own app
    pub fn add_relationship(
        &mut self,
        relationship: &str,
        target_id: &str,
        data: BTreeMap<String, String>,
        since: Option<DateTime<Utc>>,
    ) {
        self.relationships.push(Relationship {
            relationship: relationship.to_string(),
            source: None,
            target_id: target_id.to_string(),
            data,
            since,
        });
    }

    /// Relate this entity under a relationship type owned by another app
    pub fn add_foreign_relationship(
        &mut self,
        source: VendorApp,
        relationship: &str,
        target_id: &str,
        data: BTreeMap<String, String>,
    ) {
        self.relationships.push(Relationship {
            relationship: relationship.to_string(),
            source: Some(source),
            target_id: target_id.to_string(),
            data,
            since: None,
        });
    }

    pub fn set_relationships(&mut self, relationships: Vec<Relationship>) {
        self.relationships = relationships;
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn add_event(&mut self, type_name: &str, data: BTreeMap<String, String>) {
        self.events.push(Event {
            type_name: type_name.to_string(),
            time: Utc::now(),
            data,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Attach a log entry to the next write
    pub fn log(
        &mut self,
        level: LogLevel,
        message: &str,
        reference: &str,
        actor: &str,
        trace_id: &str,
        data: BTreeMap<String, String>,
    ) {
        self.logs.push(LogEntry {
            level,
            message: message.to_string(),
            reference: reference.to_string(),
            actor: actor.to_string(),
            trace_id: trace_id.to_string(),
            time: Utc::now(),
            data,
        });
    }

    pub fn log_debug(
        &mut self,
        message: &str,
        reference: &str,
        actor: &str,
        trace_id: &str,
        data: BTreeMap<String, String>,
    ) {
        self.log(LogLevel::Debug, message, reference, actor, trace_id, data);
    }

    pub fn log_info(
        &mut self,
        message: &str,
        reference: &str,
        actor: &str,
        trace_id: &str,
        data: BTreeMap<String, String>,
    ) {
        self.log(LogLevel::Info, message, reference, actor, trace_id, data);
    }

    pub fn log_notice(
        &mut self,
        message: &str,
        reference: &str,
        actor: &str,
        trace_id: &str,
        data: BTreeMap<String, String>,
    ) {
        self.log(LogLevel::Notice, message, reference, actor, trace_id, data);
    }

    pub fn log_warn(
        &mut self,
        message: &str,
        reference: &str,
        actor: &str,
        trace_id: &str,
        data: BTreeMap<String, String>,
    ) {
        self.log(LogLevel::Warn, message, reference, actor, trace_id, data);
    }

    pub fn log_error(
        &mut self,
        message: &str,
        reference: &str,
        actor: &str,
        trace_id: &str,
        data: BTreeMap<String, String>,
    ) {
        self.log(LogLevel::Error, message, reference, actor, trace_id, data);
    }

    pub fn log_critical(
        &mut self,
        message: &str,
        reference: &str,
        actor: &str,
        trace_id: &str,
        data: BTreeMap<String, String>,
    ) {
        self.log(LogLevel::Critical, message, reference, actor, trace_id, data);
    }

    pub fn log_alert(
        &mut self,
        message: &str,
        reference: &str,
        actor: &str,
        trace_id: &str,
        data: BTreeMap<String, String>,
    ) {
        self.log(LogLevel::Alert, message, reference, actor, trace_id, data);
    }

    pub fn log_fatal(
        &mut self,
        message: &str,
        reference: &str,
        actor: &str,
        trace_id: &str,
        data: BTreeMap<String, String>,
    ) {
        self.log(LogLevel::Fatal, message, reference, actor, trace_id, data);
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Record a sensor reading taken now
    pub fn add_measurement(&mut self, sensor: &str, value: f32) {
        self.add_measurement_with_data(sensor, value, BTreeMap::new());
    }

    pub fn add_measurement_with_data(
        &mut self,
        sensor: &str,
        value: f32,
        data: BTreeMap<String, String>,
    ) {
        self.measurements.push(SensorMeasurement {
            sensor: sensor.to_string(),
            value,
            at: Utc::now(),
            data,
        });
    }

    pub fn measurements(&self) -> &[SensorMeasurement] {
        &self.measurements
    }

    /// Delete a stored property on the next write
    pub fn remove_property(&mut self, name: &str) {
        self.remove_properties.push(name.to_string());
    }

    /// Delete a stored child on the next write
    pub fn remove_child(&mut self, child_id: &str) {
        self.remove_children.push(child_id.to_string());
    }

    pub fn removed_properties(&self) -> &[String] {
        &self.remove_properties
    }

    pub fn removed_children(&self) -> &[String] {
        &self.remove_children
    }

    pub fn removed_labels(&self) -> &[String] {
        &self.remove_labels
    }

    pub fn snapshot(&self) -> Option<&EntitySnapshot> {
        self.snapshot.as_ref()
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn details(&self) -> &EntityDetails {
        &self.details
    }

    pub fn counts(&self) -> &EntityCounts {
        &self.counts
    }

    /// Result of the lock requested by the last read, if any
    pub fn lock_info(&self) -> Option<&LockInfo> {
        self.lock.as_ref()
    }

    pub fn acquired_lock(&self) -> bool {
        self.lock.as_ref().is_some_and(|lock| lock.lock_acquired)
    }

    /// Take over the metadata of a read and keep its raw state as snapshot
    pub(crate) fn apply_response(&mut self, response: &EntityResponse) {
        if self.entity_id.is_empty() {
            self.entity_id = response.entity_id.clone();
        }
        self.labels = response.labels.clone();
        self.links = response.links.clone();
        self.relationships = response.relationships.clone();
        self.details = response.details.clone();
        self.counts = response.counts.clone();
        self.lock = response.lock.clone();
        self.snapshot = Some(EntitySnapshot {
            properties: property_map(response),
            children: response.children.clone(),
        });
    }

    /// Drop events, logs and measurements once they were appended remotely
    pub(crate) fn clear_appended(&mut self) {
        self.events.clear();
        self.logs.clear();
        self.measurements.clear();
    }

    /// Reset the one-shot state after a successful write
    pub(crate) fn mark_written(&mut self, entity_id: &str) {
        if self.entity_id.is_empty() {
            self.entity_id = entity_id.to_string();
        }
        self.snapshot = None;
        self.clear_appended();
        self.remove_properties.clear();
        self.remove_children.clear();
        self.remove_labels.clear();
    }
}
