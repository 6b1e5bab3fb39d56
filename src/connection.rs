use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::actor::Actor;
use crate::config::ClientConfig;
use crate::error::EntityResult;
use crate::protocol::{
    Authorization, EntityResponse, FindRequest, FindResponse, ListRequest, ListResponse,
    MutateRequest, MutateResponse, Mutator, ReportTimeSeriesRequest, RetrieveRequest, VendorApp,
};
use crate::schema::mapping::Record;
use crate::schema::registry::{SchemaRegistry, TypeRegistration};
use crate::schema::Schema;
use crate::transport::{TimedTransport, Transport};

/// Client handle for one app against one entity store
///
/// ```
/// use std::sync::Arc;
/// use fold_entity::{ClientConfig, Connection, MockTransport};
///
/// # tokio_test::block_on(async {
/// let config = ClientConfig::new("vendor", "app", "token");
/// let connection = Connection::new(Arc::new(MockTransport::new()), config);
/// assert_eq!(connection.sync_schema().await.unwrap(), 0);
/// # })
/// ```
#[derive(Clone)]
pub struct Connection {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    registry: Arc<SchemaRegistry>,
}

impl Connection {
    /// Create a connection that shares the process-wide schema registry
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self::with_registry(transport, config, SchemaRegistry::global())
    }

    /// Create a connection with its own schema registry
    pub fn with_registry(
        transport: Arc<dyn Transport>,
        config: ClientConfig,
        registry: Arc<SchemaRegistry>,
    ) -> Self {
        let transport: Arc<dyn Transport> =
            Arc::new(TimedTransport::new(transport, config.timing.clone()));
        Self {
            config,
            transport,
            registry,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn vendor_app(&self) -> VendorApp {
        VendorApp::new(&self.config.vendor_id, &self.config.app_id)
    }

    /// Credentials scoped to `workspace_id`; an empty workspace addresses the app itself
    pub fn authorization(&self, workspace_id: &str) -> Authorization {
        Authorization {
            vendor_id: self.config.vendor_id.clone(),
            app_id: self.config.app_id.clone(),
            access_token: self.config.access_token.clone(),
            workspace_id: workspace_id.to_string(),
        }
    }

    /// Actor for requests made on behalf of one caller in one workspace
    pub fn actor(
        &self,
        workspace_id: &str,
        remote_ip: &str,
        user_id: &str,
        user_agent: &str,
    ) -> Actor {
        Actor::new(
            self.clone(),
            workspace_id,
            Mutator {
                user_id: user_id.to_string(),
                remote_ip: remote_ip.to_string(),
                user_agent: user_agent.to_string(),
                client: self.config.client_label.clone(),
            },
        )
    }

    /// Register record types ahead of first use; returns how many were new
    pub fn register_types(&self, types: &[TypeRegistration]) -> EntityResult<usize> {
        self.registry.register_types(types)
    }

    /// Define every pending schema on the store
    pub async fn sync_schema(&self) -> EntityResult<usize> {
        self.registry
            .sync_schema(self.transport.as_ref(), &self.authorization(""))
            .await
    }

    /// Run [`sync_schema`](Self::sync_schema) in the background
    pub fn spawn_sync(&self) -> JoinHandle<EntityResult<usize>> {
        let connection = self.clone();
        tokio::spawn(async move { connection.sync_schema().await })
    }

    /// Schema of `R`, defining it on the store on first use
    pub async fn ensure_registered<R: Record>(&self) -> EntityResult<Schema> {
        self.registry
            .ensure_registered::<R>(self.transport.as_ref(), &self.authorization(""))
            .await
    }

    pub async fn mutate(&self, request: MutateRequest) -> EntityResult<MutateResponse> {
        self.transport.mutate(request).await
    }

    pub async fn retrieve(&self, request: RetrieveRequest) -> EntityResult<EntityResponse> {
        self.transport.retrieve(request).await
    }

    pub async fn find(&self, request: FindRequest) -> EntityResult<FindResponse> {
        self.transport.find(request).await
    }

    pub async fn list(&self, request: ListRequest) -> EntityResult<ListResponse> {
        self.transport.list(request).await
    }

    pub async fn report_time_series(
        &self,
        request: ReportTimeSeriesRequest,
    ) -> EntityResult<MutateResponse> {
        self.transport.report_time_series(request).await
    }
}
