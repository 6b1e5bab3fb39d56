//! In-memory transport for tests.
//!
//! Stores entities in a map, records every request and can be told to fail
//! or slow down specific calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{EntityError, EntityResult};
use crate::protocol::{
    Child, DefineSchemaRequest, EntityCounts, EntityDetails, EntityLocator, EntityResponse,
    EntityView, Event, FindRequest, FindResponse, Label, Link, ListRequest, ListResponse,
    LockInfo, LockRequest, LogEntry, ModifyType, MutateRequest, MutateResponse, Operator, Page,
    Property, PropertyFilter, Relationship, ReportTimeSeriesRequest, RetrieveRequest,
    SensorMeasurement, Sort,
};
use crate::schema::Schema;
use crate::transport::Transport;
use crate::value::PropertyValue;

/// Code reported when an entity cannot be found
pub const NOT_FOUND_CODE: i32 = 404;

#[derive(Debug, Clone, Default)]
pub struct StoredEntity {
    pub entity_id: String,
    pub schema: String,
    pub properties: Vec<Property>,
    pub dynamic_properties: Vec<Property>,
    pub children: Vec<Child>,
    pub labels: Vec<Label>,
    pub links: Vec<Link>,
    pub relationships: Vec<Relationship>,
    pub events: Vec<Event>,
    pub logs: Vec<LogEntry>,
    pub measurements: Vec<SensorMeasurement>,
    pub time_series: Vec<TimeSeriesPoint>,
    pub details: EntityDetails,
    pub lock: Option<LockInfo>,
}

/// Property values reported for one instant
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub properties: Vec<Property>,
}

impl StoredEntity {
    fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

#[derive(Default)]
struct MockState {
    schemas: Vec<Schema>,
    entities: Vec<StoredEntity>,
    define_calls: Vec<DefineSchemaRequest>,
    mutate_calls: Vec<MutateRequest>,
    retrieve_calls: Vec<RetrieveRequest>,
    find_calls: Vec<FindRequest>,
    list_calls: Vec<ListRequest>,
    time_series_calls: Vec<ReportTimeSeriesRequest>,
    active_sets: HashMap<String, Vec<PropertyFilter>>,
    failing_schemas: HashSet<String>,
    mutate_responses: VecDeque<MutateResponse>,
    transport_errors: VecDeque<String>,
}

impl MockState {
    fn take_transport_error(&mut self) -> EntityResult<()> {
        match self.transport_errors.pop_front() {
            Some(message) => Err(EntityError::Transport(message)),
            None => Ok(()),
        }
    }

    /// Whether an entity stored under `stored` belongs to the schema addressed by `key`
    fn schema_matches(&self, stored: &str, key: &str) -> bool {
        if stored == key {
            return true;
        }
        self.schemas.iter().any(|s| {
            (s.id == key && s.type_name == stored) || (s.type_name == key && s.id == stored)
        })
    }

    fn position(&self, entity_id: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.entity_id == entity_id)
    }

    /// Index of `entity_id`, storing a fresh entity when it is unknown or empty
    fn position_or_insert(&mut self, entity_id: Option<&str>) -> usize {
        if let Some(index) = entity_id.and_then(|id| self.position(id)) {
            return index;
        }
        let now = Utc::now();
        self.entities.push(StoredEntity {
            entity_id: entity_id
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
            details: EntityDetails {
                created: Some(now),
                state: "active".to_string(),
                state_change: Some(now),
                last_update: None,
            },
            ..StoredEntity::default()
        });
        self.entities.len() - 1
    }

    fn find_conflict(&self, request: &MutateRequest) -> Option<usize> {
        let schema = request.schema.as_ref()?;
        if request.conflict_unique_properties.is_empty() {
            return None;
        }
        self.entities.iter().position(|entity| {
            self.schema_matches(&entity.schema, &schema.key)
                && request.conflict_unique_properties.iter().all(|name| {
                    let incoming = request
                        .mutation
                        .properties
                        .iter()
                        .find(|p| &p.name == name)
                        .map(|p| &p.value);
                    incoming.is_some() && incoming == entity.property(name)
                })
        })
    }
}

/// Transport backed by process memory
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
    define_delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every define call, to widen races between first users of a type
    pub fn with_define_delay(mut self, delay: Duration) -> Self {
        self.define_delay = Some(delay);
        self
    }

    fn lock(&self) -> EntityResult<MutexGuard<'_, MockState>> {
        self.state
            .lock()
            .map_err(|_| EntityError::Transport("Failed to acquire mock lock".to_string()))
    }

    /// Make define calls for `type_name` fail until cleared
    pub fn fail_define(&self, type_name: &str) -> EntityResult<()> {
        self.lock()?.failing_schemas.insert(type_name.to_string());
        Ok(())
    }

    pub fn clear_define_failure(&self, type_name: &str) -> EntityResult<()> {
        self.lock()?.failing_schemas.remove(type_name);
        Ok(())
    }

    /// Answer the next mutate call with `response` instead of applying it
    pub fn queue_mutate_response(&self, response: MutateResponse) -> EntityResult<()> {
        self.lock()?.mutate_responses.push_back(response);
        Ok(())
    }

    /// Fail the next call of any kind with a transport error
    pub fn queue_transport_error(&self, message: &str) -> EntityResult<()> {
        self.lock()?.transport_errors.push_back(message.to_string());
        Ok(())
    }

    /// Store an entity directly, bypassing the mutate path
    pub fn insert_entity(&self, entity: StoredEntity) -> EntityResult<()> {
        self.lock()?.entities.push(entity);
        Ok(())
    }

    pub fn entity(&self, entity_id: &str) -> EntityResult<Option<StoredEntity>> {
        let state = self.lock()?;
        Ok(state.position(entity_id).map(|i| state.entities[i].clone()))
    }

    pub fn entity_count(&self) -> EntityResult<usize> {
        Ok(self.lock()?.entities.len())
    }

    pub fn define_calls(&self) -> EntityResult<Vec<DefineSchemaRequest>> {
        Ok(self.lock()?.define_calls.clone())
    }

    /// Number of define calls made for `type_name`
    pub fn define_count(&self, type_name: &str) -> EntityResult<usize> {
        Ok(self
            .lock()?
            .define_calls
            .iter()
            .filter(|c| c.schema.type_name == type_name)
            .count())
    }

    pub fn mutate_calls(&self) -> EntityResult<Vec<MutateRequest>> {
        Ok(self.lock()?.mutate_calls.clone())
    }

    pub fn last_mutate(&self) -> EntityResult<Option<MutateRequest>> {
        Ok(self.lock()?.mutate_calls.last().cloned())
    }

    pub fn retrieve_calls(&self) -> EntityResult<Vec<RetrieveRequest>> {
        Ok(self.lock()?.retrieve_calls.clone())
    }

    pub fn find_calls(&self) -> EntityResult<Vec<FindRequest>> {
        Ok(self.lock()?.find_calls.clone())
    }

    pub fn list_calls(&self) -> EntityResult<Vec<ListRequest>> {
        Ok(self.lock()?.list_calls.clone())
    }

    pub fn time_series_calls(&self) -> EntityResult<Vec<ReportTimeSeriesRequest>> {
        Ok(self.lock()?.time_series_calls.clone())
    }

    /// Declare an active set whose members are the entities matching `filters`
    pub fn define_active_set(&self, name: &str, filters: Vec<PropertyFilter>) -> EntityResult<()> {
        self.lock()?.active_sets.insert(name.to_string(), filters);
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn define_schema(&self, request: DefineSchemaRequest) -> EntityResult<Schema> {
        if let Some(delay) = self.define_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock()?;
        state.define_calls.push(request.clone());
        state.take_transport_error()?;

        let mut schema = request.schema;
        if state.failing_schemas.contains(&schema.type_name) {
            return Err(EntityError::Transport(format!(
                "define_schema rejected for '{}'",
                schema.type_name
            )));
        }

        match state.schemas.iter().position(|s| s.type_name == schema.type_name) {
            Some(index) => {
                schema.id = state.schemas[index].id.clone();
                state.schemas[index] = schema.clone();
            }
            None => {
                schema.id = Uuid::new_v4().simple().to_string();
                state.schemas.push(schema.clone());
            }
        }
        schema.source = Some(request.authorization.source());
        Ok(schema)
    }

    async fn mutate(&self, request: MutateRequest) -> EntityResult<MutateResponse> {
        let mut state = self.lock()?;
        state.mutate_calls.push(request.clone());
        state.take_transport_error()?;
        if let Some(response) = state.mutate_responses.pop_front() {
            return Ok(response);
        }

        let entity_id = request.entity_id.clone().filter(|id| !id.is_empty());
        let index = match &entity_id {
            Some(id) => state.position_or_insert(Some(id)),
            None => match state.find_conflict(&request) {
                Some(index) => index,
                None => state.position_or_insert(None),
            },
        };

        let now = Utc::now();
        let entity = &mut state.entities[index];
        if let Some(schema) = &request.schema {
            if entity.schema.is_empty() {
                entity.schema = schema.key.clone();
            }
        }
        apply_mutation(entity, request);
        entity.details.last_update = Some(now);

        Ok(MutateResponse {
            success: true,
            entity_id: entity.entity_id.clone(),
            error_code: 0,
            error_message: String::new(),
        })
    }

    async fn retrieve(&self, request: RetrieveRequest) -> EntityResult<EntityResponse> {
        let mut state = self.lock()?;
        state.retrieve_calls.push(request.clone());
        state.take_transport_error()?;

        let found = match &request.locator {
            EntityLocator::ById(id) => state.position(id),
            EntityLocator::ByUnique {
                schema_id,
                property,
                value,
            } => state.entities.iter().position(|entity| {
                state.schema_matches(&entity.schema, schema_id)
                    && entity
                        .property(property)
                        .is_some_and(|v| &v.text == value)
            }),
        };

        let Some(index) = found else {
            return Err(EntityError::remote(NOT_FOUND_CODE, "entity not found"));
        };
        let lock = request
            .view
            .lock
            .as_ref()
            .map(|wanted| acquire_lock(&mut state.entities[index], wanted));

        let mut response = build_response(&state, &state.entities[index], &request.view);
        response.lock = lock;
        Ok(response)
    }

    async fn find(&self, request: FindRequest) -> EntityResult<FindResponse> {
        let mut state = self.lock()?;
        state.find_calls.push(request.clone());
        state.take_transport_error()?;

        let mut matches: Vec<&StoredEntity> = state
            .entities
            .iter()
            .filter(|e| state.schema_matches(&e.schema, &request.schema.key))
            .filter(|e| request.filters.iter().all(|f| filter_matches(e, f)))
            .filter(|e| request.labels.iter().all(|l| e.labels.contains(l)))
            .filter(|e| match &request.parent_entity_id {
                Some(parent) => e.entity_id.starts_with(&format!("{}-", parent)),
                None => true,
            })
            .filter(|e| match &request.relation {
                Some(relation) => relation_matches(&state.entities, e, relation),
                None => true,
            })
            .collect();

        sort_entities(&mut matches, &request.sort);
        Ok(FindResponse {
            entities: paginate(matches, request.page)
                .into_iter()
                .map(|e| build_response(&state, e, &request.view))
                .collect(),
        })
    }

    async fn list(&self, request: ListRequest) -> EntityResult<ListResponse> {
        let mut state = self.lock()?;
        state.list_calls.push(request.clone());
        state.take_transport_error()?;

        let Some(set_filters) = state.active_sets.get(&request.from_view) else {
            return Err(EntityError::remote(
                NOT_FOUND_CODE,
                format!("active set '{}' not found", request.from_view),
            ));
        };

        let mut matches: Vec<&StoredEntity> = state
            .entities
            .iter()
            .filter(|e| state.schema_matches(&e.schema, &request.schema.key))
            .filter(|e| set_filters.iter().all(|f| filter_matches(e, f)))
            .filter(|e| request.filters.iter().all(|f| filter_matches(e, f)))
            .collect();
        sort_entities(&mut matches, &request.sort);

        let view = EntityView {
            properties: vec![crate::protocol::PropertyRequest {
                properties: request.properties.clone(),
                ..Default::default()
            }],
            ..EntityView::default()
        };
        Ok(ListResponse {
            entities: paginate(matches, request.page)
                .into_iter()
                .map(|e| build_response(&state, e, &view))
                .collect(),
        })
    }

    async fn report_time_series(
        &self,
        request: ReportTimeSeriesRequest,
    ) -> EntityResult<MutateResponse> {
        let mut state = self.lock()?;
        state.time_series_calls.push(request.clone());
        state.take_transport_error()?;
        if let Some(response) = state.mutate_responses.pop_front() {
            return Ok(response);
        }

        let entity_id = request.entity_id.as_deref().filter(|id| !id.is_empty());
        let index = state.position_or_insert(entity_id);
        let entity = &mut state.entities[index];
        if entity.schema.is_empty() {
            entity.schema = request.schema.key.clone();
        }
        entity.time_series.push(TimeSeriesPoint {
            timestamp: request.timestamp,
            properties: request.mutation.properties.clone(),
        });
        for property in request.mutation.properties {
            upsert_property(&mut entity.properties, property);
        }
        for label in request.mutation.labels {
            entity.labels.retain(|l| l.name != label.name);
            entity.labels.push(label);
        }
        entity.details.last_update = Some(request.timestamp);

        Ok(MutateResponse {
            success: true,
            entity_id: entity.entity_id.clone(),
            error_code: 0,
            error_message: String::new(),
        })
    }
}

fn sort_entities(entities: &mut [&StoredEntity], sort: &[Sort]) {
    for sort in sort.iter().rev() {
        entities.sort_by(|a, b| {
            let left = a.property(&sort.property).cloned().unwrap_or_default();
            let right = b.property(&sort.property).cloned().unwrap_or_default();
            let ordering = compare_values(&left, &right).unwrap_or(Ordering::Equal);
            if sort.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

fn paginate<T>(items: Vec<T>, page: Option<Page>) -> Vec<T> {
    match page {
        Some(page) if page.per_page > 0 => {
            let per_page = page.per_page as usize;
            items
                .into_iter()
                .skip(per_page.saturating_mul(page.page_number as usize))
                .take(per_page)
                .collect()
        }
        _ => items,
    }
}

/// Grant `wanted` unless another unexpired lock is held
fn acquire_lock(entity: &mut StoredEntity, wanted: &LockRequest) -> LockInfo {
    let now = Utc::now();
    if let Some(held) = entity.lock.as_ref().filter(|held| held.locked_until > now) {
        return LockInfo {
            lock_acquired: false,
            ..held.clone()
        };
    }

    let granted = LockInfo {
        id: Uuid::new_v4().simple().to_string(),
        locked_until: now + chrono::Duration::seconds(i64::from(wanted.duration_seconds)),
        message: wanted.message.clone(),
        lock_acquired: true,
    };
    entity.lock = Some(granted.clone());
    granted
}

fn apply_mutation(entity: &mut StoredEntity, request: MutateRequest) {
    let mutation = request.mutation;

    for property in mutation.properties {
        upsert_property(&mut entity.properties, property);
    }
    entity
        .properties
        .retain(|p| !mutation.remove_properties.contains(&p.name));

    for property in mutation.dynamic_properties {
        upsert_property(&mut entity.dynamic_properties, property);
    }
    entity
        .dynamic_properties
        .retain(|p| !mutation.remove_dynamic_properties.contains(&p.name));

    for mut child in mutation.children {
        if child.child_id.is_empty() {
            child.child_id = Uuid::new_v4().simple().to_string();
        }
        match entity
            .children
            .iter()
            .position(|c| c.type_name == child.type_name && c.child_id == child.child_id)
        {
            Some(index) => entity.children[index] = child,
            None => entity.children.push(child),
        }
    }
    entity
        .children
        .retain(|c| !mutation.remove_children.contains(&c.child_id));

    for label in mutation.labels {
        entity.labels.retain(|l| l.name != label.name);
        entity.labels.push(label);
    }
    entity
        .labels
        .retain(|l| !mutation.remove_labels.contains(&l.name));

    entity.links.extend(mutation.links);
    entity.relationships.extend(mutation.relationships);
    entity.events.extend(mutation.events);
    entity.logs.extend(mutation.logs);
    entity.measurements.extend(mutation.measurements);
}

fn upsert_property(properties: &mut Vec<Property>, property: Property) {
    let Some(index) = properties.iter().position(|p| p.name == property.name) else {
        properties.push(Property::new(property.name, property.value));
        return;
    };

    let stored = &mut properties[index].value;
    match property.modify {
        ModifyType::Set => *stored = property.value,
        ModifyType::Append => {
            for s in property.value.strings {
                if !stored.strings.contains(&s) {
                    stored.strings.push(s);
                }
            }
            for i in property.value.ints {
                if !stored.ints.contains(&i) {
                    stored.ints.push(i);
                }
            }
            stored.map.extend(property.value.map);
        }
        ModifyType::Reduce => {
            stored.strings.retain(|s| !property.value.strings.contains(s));
            stored.ints.retain(|i| !property.value.ints.contains(i));
            stored.map.retain(|k, _| !property.value.map.contains_key(k));
        }
    }
}

fn build_response(state: &MockState, entity: &StoredEntity, view: &EntityView) -> EntityResponse {
    let mut properties = Vec::new();
    if view.properties.is_empty() {
        properties.extend(entity.properties.iter().map(|p| redact(p, false)));
    }
    for request in &view.properties {
        for property in &entity.properties {
            let wanted =
                request.properties.is_empty() || request.properties.contains(&property.name);
            if wanted && !properties.iter().any(|p: &Property| p.name == property.name) {
                properties.push(redact(property, request.decrypt));
            }
        }
    }

    let dynamic_properties = entity
        .dynamic_properties
        .iter()
        .filter(|p| view.dynamic_properties.contains(&p.name))
        .cloned()
        .collect();

    let children = entity
        .children
        .iter()
        .filter(|child| {
            view.children.iter().any(|request| {
                request.type_name == child.type_name
                    && (request.ids.is_empty() || request.ids.contains(&child.child_id))
            })
        })
        .cloned()
        .collect();

    let mut counts = EntityCounts::default();
    if view.relationship_count {
        counts.total_relationships = entity.relationships.len() as i64;
    }
    for key in &view.relationship_count_types {
        let count = entity
            .relationships
            .iter()
            .filter(|r| r.relationship == key.key)
            .count();
        counts.relationships.insert(key.key.clone(), count as i64);
    }
    if view.child_count {
        counts.children = entity.children.len() as i64;
    }
    for key in &view.descendant_count_types {
        let prefix = format!("{}-", entity.entity_id);
        let count = state
            .entities
            .iter()
            .filter(|e| {
                e.entity_id.starts_with(&prefix) && state.schema_matches(&e.schema, &key.key)
            })
            .count();
        counts.descendants.insert(key.key.clone(), count as i64);
    }

    let relationships = if view.relationships.is_empty() {
        Vec::new()
    } else {
        entity
            .relationships
            .iter()
            .filter(|r| {
                view.relationships
                    .iter()
                    .any(|k| k.key.is_empty() || k.key == r.relationship)
            })
            .cloned()
            .collect()
    };

    EntityResponse {
        entity_id: entity.entity_id.clone(),
        schema: entity.schema.clone(),
        properties,
        dynamic_properties,
        children,
        labels: if view.labels { entity.labels.clone() } else { Vec::new() },
        links: if view.links { entity.links.clone() } else { Vec::new() },
        relationships,
        details: entity.details.clone(),
        counts,
        lock: None,
    }
}

fn redact(property: &Property, decrypt: bool) -> Property {
    let mut property = property.clone();
    if !decrypt {
        property.value.secure_text.clear();
    }
    property
}

fn relation_matches(
    entities: &[StoredEntity],
    candidate: &StoredEntity,
    relation: &crate::protocol::RelationFilter,
) -> bool {
    let key_matches = |r: &Relationship| {
        relation.relationship.key.is_empty() || r.relationship == relation.relationship.key
    };

    if !relation.source_id.is_empty() {
        let related = entities
            .iter()
            .find(|e| e.entity_id == relation.source_id)
            .is_some_and(|source| {
                source
                    .relationships
                    .iter()
                    .any(|r| key_matches(r) && r.target_id == candidate.entity_id)
            });
        if !related {
            return false;
        }
    }
    if !relation.destination_id.is_empty() {
        let related = candidate
            .relationships
            .iter()
            .any(|r| key_matches(r) && r.target_id == relation.destination_id);
        if !related {
            return false;
        }
    }
    true
}

fn compare_values(left: &PropertyValue, right: &PropertyValue) -> Option<Ordering> {
    if !left.text.is_empty() || !right.text.is_empty() {
        return Some(left.text.cmp(&right.text));
    }
    if left.time.is_some() || right.time.is_some() {
        return Some(left.time.cmp(&right.time));
    }
    if left.float != 0.0 || right.float != 0.0 {
        return left.float.partial_cmp(&right.float);
    }
    if left.int != 0 || right.int != 0 {
        return Some(left.int.cmp(&right.int));
    }
    Some(left.boolean.cmp(&right.boolean))
}

fn filter_matches(entity: &StoredEntity, filter: &PropertyFilter) -> bool {
    let value = entity.property(&filter.property).cloned().unwrap_or_default();
    let first = filter.values.first().cloned().unwrap_or_default();
    let ordering = compare_values(&value, &first);

    match filter.operator {
        Operator::Equal => ordering == Some(Ordering::Equal),
        Operator::NotEqual => ordering != Some(Ordering::Equal),
        Operator::GreaterThan => ordering == Some(Ordering::Greater),
        Operator::GreaterThanOrEqual => {
            matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
        }
        Operator::LessThan => ordering == Some(Ordering::Less),
        Operator::LessThanOrEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        Operator::Contains => {
            value.text.contains(&first.text) || value.strings.contains(&first.text)
        }
        Operator::NotContains => {
            !(value.text.contains(&first.text) || value.strings.contains(&first.text))
        }
        Operator::StartsWith => value.text.starts_with(&first.text),
        Operator::EndsWith => value.text.ends_with(&first.text),
        Operator::In => filter
            .values
            .iter()
            .any(|v| compare_values(&value, v) == Some(Ordering::Equal)),
        Operator::NotIn => !filter
            .values
            .iter()
            .any(|v| compare_values(&value, v) == Some(Ordering::Equal)),
        Operator::Between => match filter.values.get(1) {
            Some(upper) => {
                let upper = compare_values(&value, upper);
                matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
                    && matches!(upper, Some(Ordering::Less | Ordering::Equal))
            }
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Authorization, Mutation, SchemaKey};

    fn write(transport_entity: Option<&str>, properties: Vec<Property>) -> MutateRequest {
        MutateRequest {
            authorization: Authorization::default(),
            entity_id: transport_entity.map(str::to_string),
            schema: Some(SchemaKey::new("customer", None)),
            mutation: Mutation {
                properties,
                ..Mutation::default()
            },
            conflict_unique_properties: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_mutate_then_retrieve() {
        let transport = MockTransport::new();
        let response = transport
            .mutate(write(None, vec![Property::new("name", PropertyValue::text("Ada"))]))
            .await
            .unwrap();
        assert!(response.success);

        let entity = transport
            .retrieve(RetrieveRequest {
                authorization: Authorization::default(),
                locator: EntityLocator::ById(response.entity_id.clone()),
                schema: None,
                view: EntityView::default(),
            })
            .await
            .unwrap();
        assert_eq!(entity.property("name"), Some(&PropertyValue::text("Ada")));
    }

    #[tokio::test]
    async fn test_secure_text_needs_decrypt() {
        let transport = MockTransport::new();
        let response = transport
            .mutate(write(None, vec![Property::new("ssn", PropertyValue::secure("1**4", "1234"))]))
            .await
            .unwrap();

        let entity = transport
            .retrieve(RetrieveRequest {
                authorization: Authorization::default(),
                locator: EntityLocator::ById(response.entity_id),
                schema: None,
                view: EntityView::default(),
            })
            .await
            .unwrap();
        let value = entity.property("ssn").unwrap();
        assert_eq!(value.text, "1**4");
        assert!(value.secure_text.is_empty());
    }

    #[tokio::test]
    async fn test_missing_entity_is_not_found() {
        let transport = MockTransport::new();
        let result = transport
            .retrieve(RetrieveRequest {
                authorization: Authorization::default(),
                locator: EntityLocator::ById("missing".to_string()),
                schema: None,
                view: EntityView::default(),
            })
            .await;
        assert!(matches!(result, Err(EntityError::Remote { code: NOT_FOUND_CODE, .. })));
    }

    #[tokio::test]
    async fn test_append_property() {
        let transport = MockTransport::new();
        let created = transport
            .mutate(write(
                None,
                vec![Property::new("tags", PropertyValue::strings(vec!["a".to_string()]))],
            ))
            .await
            .unwrap();
        transport
            .mutate(write(
                Some(&created.entity_id),
                vec![Property::append("tags", PropertyValue::strings(vec!["b".to_string()]))],
            ))
            .await
            .unwrap();

        let stored = transport.entity(&created.entity_id).unwrap().unwrap();
        assert_eq!(stored.property("tags").unwrap().strings, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_find_past_the_last_page_is_empty() {
        let transport = MockTransport::new();
        transport
            .mutate(write(None, vec![Property::new("name", PropertyValue::text("Ada"))]))
            .await
            .unwrap();

        let mut request = FindRequest::new(
            Authorization::default(),
            SchemaKey::new("customer", None),
        );
        request.page = Some(Page {
            per_page: u32::MAX,
            page_number: u32::MAX,
        });
        let found = transport.find(request).await.unwrap();
        assert!(found.entities.is_empty());

        let page = Page {
            per_page: 2,
            page_number: 1,
        };
        assert_eq!(paginate(vec![1, 2, 3], Some(page)), vec![3]);
    }
}
