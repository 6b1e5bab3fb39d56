//! Requests made on behalf of one caller in one workspace.

use std::collections::HashMap;

use crate::codec::decoder::{decode, decode_properties};
use crate::codec::encoder::{encode, ENTITY_ID_KEY};
use crate::codec::generic::GenericResult;
use crate::connection::Connection;
use crate::diff::{changed_children, changed_properties};
use crate::entity::{Entity, TimeSeriesRecord};
use crate::error::{EntityError, EntityResult};
use crate::protocol::{
    Authorization, EntityLocator, EntityResponse, EntityView, FindRequest, ListRequest,
    MutateRequest, Mutation, Mutator, Property, ReportTimeSeriesRequest, RetrieveRequest,
    SchemaKey, VendorApp,
};
use crate::query::{FindOption, MutateOption, RetrieveBy, RetrieveOption};
use crate::value::PropertyValue;
use crate::{log_actor_debug, log_actor_warn, log_query_debug};

#[derive(Clone)]
pub struct Actor {
    connection: Connection,
    workspace_id: String,
    mutator: Mutator,
}

impl Actor {
    pub(crate) fn new(connection: Connection, workspace_id: &str, mutator: Mutator) -> Self {
        Self {
            connection,
            workspace_id: workspace_id.to_string(),
            mutator,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn replace_connection(&mut self, connection: Connection) {
        self.connection = connection;
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn user_id(&self) -> &str {
        &self.mutator.user_id
    }

    pub fn remote_ip(&self) -> &str {
        &self.mutator.remote_ip
    }

    pub fn user_agent(&self) -> &str {
        &self.mutator.user_agent
    }

    pub fn client(&self) -> &str {
        &self.mutator.client
    }

    /// Override the client label reported with writes
    pub fn set_client(&mut self, client: &str) {
        self.mutator.client = client.to_string();
    }

    pub fn vendor_id(&self) -> &str {
        &self.connection.config().vendor_id
    }

    pub fn app_id(&self) -> &str {
        &self.connection.config().app_id
    }

    pub fn vendor_app(&self) -> VendorApp {
        self.connection.vendor_app()
    }

    pub fn authorization(&self) -> Authorization {
        self.connection.authorization(&self.workspace_id)
    }

    /// Store `record` as a new entity
    pub async fn create<R: Entity>(
        &self,
        record: &mut R,
        comment: &str,
        options: &[MutateOption],
    ) -> EntityResult<()> {
        if !record.entity_id().is_empty() {
            return Err(EntityError::InvalidInput(format!(
                "create called for existing entity '{}'",
                record.entity_id()
            )));
        }
        self.mutate(record, comment, options).await
    }

    /// Write the changes made to `record` since it was loaded.
    ///
    /// Every encoded property missing from the snapshot is sent. After a read
    /// limited by `with_properties`, fields that were not loaded still hold
    /// their zero values and will overwrite the stored values; load every
    /// property before updating, or restrict the write with
    /// `mutate_properties`.
    pub async fn update<R: Entity>(
        &self,
        record: &mut R,
        comment: &str,
        options: &[MutateOption],
    ) -> EntityResult<()> {
        self.mutate(record, comment, options).await
    }

    /// Write `record`, creating the entity when it has no id yet.
    ///
    /// With a snapshot from a previous read only changed properties and
    /// children are sent; otherwise everything is.
    pub async fn mutate<R: Entity>(
        &self,
        record: &mut R,
        comment: &str,
        options: &[MutateOption],
    ) -> EntityResult<()> {
        let schema = self.connection.ensure_registered::<R>().await?;
        let encoded = encode(record);

        let base = record.base();
        let entity_id = if base.entity_id.is_empty() {
            encoded.entity_id.clone().unwrap_or_default()
        } else {
            base.entity_id.clone()
        };

        let (properties, children) = match base.snapshot() {
            Some(snapshot) => (
                changed_properties(&snapshot.properties, encoded.properties),
                changed_children(&snapshot.children, encoded.children),
            ),
            None => (encoded.properties, encoded.children),
        };

        let mutation = Mutation {
            properties,
            remove_properties: base.removed_properties().to_vec(),
            children,
            remove_children: base.removed_children().to_vec(),
            relationships: base.relationships().to_vec(),
            labels: base.labels().to_vec(),
            remove_labels: base.removed_labels().to_vec(),
            links: base.links().to_vec(),
            events: base.events().to_vec(),
            logs: base.logs().to_vec(),
            measurements: base.measurements().to_vec(),
            comment: comment.to_string(),
            mutator: self.mutator.clone(),
            ..Mutation::default()
        };

        let source = schema.source.clone().unwrap_or_else(|| self.vendor_app());
        let mut request = MutateRequest {
            authorization: self.authorization(),
            entity_id: if entity_id.is_empty() {
                None
            } else {
                Some(entity_id.clone())
            },
            schema: Some(SchemaKey::new(&schema.type_name, Some(source))),
            mutation,
            conflict_unique_properties: Vec::new(),
        };
        for option in options {
            option.apply(&mut request);
        }

        log_actor_debug!(
            "Mutating '{}' entity {} with {} properties",
            schema.type_name,
            if entity_id.is_empty() { "<new>" } else { entity_id.as_str() },
            request.mutation.properties.len()
        );

        let response = self.connection.mutate(request).await?;
        response.check()?;
        if !response.success {
            log_actor_warn!("Mutation of '{}' was not applied", schema.type_name);
            return Ok(());
        }

        if entity_id.is_empty() {
            assign_entity_id(record, &response.entity_id);
        }
        record.base_mut().mark_written(&response.entity_id);
        Ok(())
    }

    /// Append the record's pending events, logs and measurements without
    /// touching its properties
    pub async fn remote_mutate<R: Entity>(
        &self,
        record: &mut R,
        comment: &str,
    ) -> EntityResult<()> {
        let entity_id = record.entity_id().to_string();
        if entity_id.is_empty() {
            return Err(EntityError::InvalidInput(
                "entity id is required for remote mutations".to_string(),
            ));
        }

        let base = record.base();
        let request = MutateRequest {
            authorization: self.authorization(),
            entity_id: Some(entity_id),
            schema: None,
            mutation: Mutation {
                events: base.events().to_vec(),
                logs: base.logs().to_vec(),
                measurements: base.measurements().to_vec(),
                comment: comment.to_string(),
                mutator: self.mutator.clone(),
                ..Mutation::default()
            },
            conflict_unique_properties: Vec::new(),
        };

        let response = self.connection.mutate(request).await?;
        response.check()?;
        record.base_mut().clear_appended();
        Ok(())
    }

    /// Record the current values of `record` as one point of its time series.
    ///
    /// Every non-omitted property is sent along with the record's labels; the
    /// point is stamped with [`TimeSeriesRecord::time_series_input_time`].
    pub async fn report_time_series<R: TimeSeriesRecord>(
        &self,
        record: &mut R,
        comment: &str,
    ) -> EntityResult<()> {
        let schema = self.connection.ensure_registered::<R>().await?;
        let encoded = encode(record);
        let entity_id = record.entity_id().to_string();

        let source = schema.source.clone().unwrap_or_else(|| self.vendor_app());
        let request = ReportTimeSeriesRequest {
            authorization: self.authorization(),
            entity_id: if entity_id.is_empty() {
                None
            } else {
                Some(entity_id.clone())
            },
            schema: SchemaKey::new(&schema.type_name, Some(source)),
            mutation: Mutation {
                properties: changed_properties(&HashMap::new(), encoded.properties),
                labels: record.base().labels().to_vec(),
                comment: comment.to_string(),
                mutator: self.mutator.clone(),
                ..Mutation::default()
            },
            timestamp: record.time_series_input_time(),
        };

        log_actor_debug!(
            "Reporting '{}' time series point at {}",
            schema.type_name,
            request.timestamp
        );

        let response = self.connection.report_time_series(request).await?;
        response.check()?;
        if response.success && entity_id.is_empty() {
            assign_entity_id(record, &response.entity_id);
        }
        Ok(())
    }

    /// Load one entity into `record` and keep its raw state as the snapshot
    pub async fn get<R: Entity>(
        &self,
        by: RetrieveBy,
        record: &mut R,
        options: &[RetrieveOption],
    ) -> EntityResult<()> {
        validate_retrieve_by(&by)?;
        let schema = self.connection.ensure_registered::<R>().await?;

        let locator = match by {
            RetrieveBy::EntityId(entity_id) => EntityLocator::ById(entity_id),
            RetrieveBy::UniqueProperty { property, value } => EntityLocator::ByUnique {
                schema_id: schema.lookup_id().to_string(),
                property,
                value,
            },
        };

        let request = RetrieveRequest {
            authorization: self.authorization(),
            locator,
            schema: Some(SchemaKey::new(&schema.type_name, Some(self.vendor_app()))),
            view: self.view(options),
        };

        let response = self.connection.retrieve(request).await?;
        decode(&response, record);
        record.base_mut().apply_response(&response);
        Ok(())
    }

    pub async fn get_by_id<R: Entity>(
        &self,
        entity_id: &str,
        record: &mut R,
        options: &[RetrieveOption],
    ) -> EntityResult<()> {
        self.get(RetrieveBy::entity_id(entity_id), record, options).await
    }

    pub async fn get_by_unique_property<R: Entity>(
        &self,
        property: &str,
        value: &str,
        record: &mut R,
        options: &[RetrieveOption],
    ) -> EntityResult<()> {
        self.get(RetrieveBy::unique_property(property, value), record, options)
            .await
    }

    /// Load one entity without a record type
    pub async fn get_generic(
        &self,
        type_name: &str,
        entity_id: &str,
        options: &[RetrieveOption],
    ) -> EntityResult<GenericResult> {
        validate_retrieve_by(&RetrieveBy::entity_id(entity_id))?;
        let request = RetrieveRequest {
            authorization: self.authorization(),
            locator: EntityLocator::ById(entity_id.to_string()),
            schema: Some(SchemaKey::new(type_name, Some(self.vendor_app()))),
            view: self.view(options),
        };

        let response = self.connection.retrieve(request).await?;
        Ok(GenericResult::from_response(&response))
    }

    /// Search entities of `type_name`, returning the raw responses
    pub async fn find(
        &self,
        type_name: &str,
        options: &[FindOption],
    ) -> EntityResult<Vec<EntityResponse>> {
        let mut request = FindRequest::new(
            self.authorization(),
            SchemaKey::new(type_name, Some(self.vendor_app())),
        );
        for option in options {
            option.apply(&mut request);
        }
        let source = self.vendor_app();
        for property in &mut request.view.properties {
            property.source = Some(source.clone());
        }

        log_query_debug!(
            "Finding '{}' with {} filters and {} labels",
            type_name,
            request.filters.len(),
            request.labels.len()
        );
        Ok(self.connection.find(request).await?.entities)
    }

    /// Search entities of `R`'s schema and decode each into a fresh record
    pub async fn find_records<R: Entity + Default>(
        &self,
        options: &[FindOption],
    ) -> EntityResult<Vec<R>> {
        let schema = self.connection.ensure_registered::<R>().await?;
        let responses = self.find(&schema.type_name, options).await?;

        let mut records = Vec::with_capacity(responses.len());
        for response in &responses {
            let mut record = R::default();
            decode(response, &mut record);
            record.base_mut().apply_response(response);
            records.push(record);
        }
        Ok(records)
    }

    pub async fn find_generic(
        &self,
        type_name: &str,
        options: &[FindOption],
    ) -> EntityResult<Vec<GenericResult>> {
        let responses = self.find(type_name, options).await?;
        Ok(responses.iter().map(GenericResult::from_response).collect())
    }

    /// Read the members of the active set `active_set` of `type_name`.
    ///
    /// Only the filter, sort and paging parts of `options` apply; `properties`
    /// names the properties to return, all of them when empty.
    pub async fn list(
        &self,
        type_name: &str,
        active_set: &str,
        properties: &[&str],
        options: &[FindOption],
    ) -> EntityResult<Vec<EntityResponse>> {
        if active_set.is_empty() {
            return Err(EntityError::InvalidInput(
                "active set name is required".to_string(),
            ));
        }

        let schema = SchemaKey::new(type_name, Some(self.vendor_app()));
        let mut find = FindRequest::new(self.authorization(), schema.clone());
        for option in options {
            option.apply(&mut find);
        }

        let request = ListRequest {
            authorization: find.authorization,
            schema,
            from_view: active_set.to_string(),
            properties: properties.iter().map(|s| s.to_string()).collect(),
            filters: find.filters,
            sort: find.sort,
            page: find.page,
        };

        log_query_debug!(
            "Listing '{}' from active set '{}' with {} filters",
            type_name,
            active_set,
            request.filters.len()
        );
        Ok(self.connection.list(request).await?.entities)
    }

    /// Write properties that are not declared on any record type
    pub async fn set_dynamic_properties(
        &self,
        entity_id: &str,
        properties: Vec<Property>,
        remove: &[&str],
        comment: &str,
    ) -> EntityResult<()> {
        if entity_id.is_empty() {
            return Err(EntityError::InvalidInput(
                "entity id is required for dynamic properties".to_string(),
            ));
        }

        let request = MutateRequest {
            authorization: self.authorization(),
            entity_id: Some(entity_id.to_string()),
            schema: None,
            mutation: Mutation {
                dynamic_properties: properties,
                remove_dynamic_properties: remove.iter().map(|s| s.to_string()).collect(),
                comment: comment.to_string(),
                mutator: self.mutator.clone(),
                ..Mutation::default()
            },
            conflict_unique_properties: Vec::new(),
        };

        self.connection.mutate(request).await?.check()
    }

    pub async fn get_dynamic_properties(
        &self,
        entity_id: &str,
        names: &[&str],
    ) -> EntityResult<HashMap<String, PropertyValue>> {
        validate_retrieve_by(&RetrieveBy::entity_id(entity_id))?;
        let request = RetrieveRequest {
            authorization: self.authorization(),
            locator: EntityLocator::ById(entity_id.to_string()),
            schema: None,
            view: EntityView {
                dynamic_properties: names.iter().map(|s| s.to_string()).collect(),
                ..EntityView::default()
            },
        };

        let response = self.connection.retrieve(request).await?;
        Ok(response
            .dynamic_properties
            .into_iter()
            .map(|p| (p.name, p.value))
            .collect())
    }

    /// Build a view and scope its property and relationship requests to this app
    fn view(&self, options: &[RetrieveOption]) -> EntityView {
        let mut view = EntityView::default();
        for option in options {
            option.apply(&mut view);
        }

        let source = self.vendor_app();
        for property in &mut view.properties {
            property.source = Some(source.clone());
        }
        for relationship in &mut view.relationships {
            relationship.source = Some(source.clone());
        }
        view
    }
}

/// Write a store-assigned id to the record's `_entity_id` field and its base
fn assign_entity_id<R: Entity>(record: &mut R, entity_id: &str) {
    let assigned = HashMap::from([(
        ENTITY_ID_KEY.to_string(),
        PropertyValue::text(entity_id),
    )]);
    decode_properties(&assigned, &[], record);
    record.base_mut().entity_id = entity_id.to_string();
}

fn validate_retrieve_by(by: &RetrieveBy) -> EntityResult<()> {
    match by {
        RetrieveBy::EntityId(entity_id) if entity_id.is_empty() => Err(EntityError::InvalidInput(
            "entity id is required".to_string(),
        )),
        RetrieveBy::UniqueProperty { property, .. } if property.is_empty() => Err(
            EntityError::InvalidInput("unique property name is required".to_string()),
        ),
        _ => Ok(()),
    }
}
