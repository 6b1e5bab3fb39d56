//! The RPC seam between the mapping layer and the entity store.

use async_trait::async_trait;

use crate::error::EntityResult;
use crate::protocol::{
    DefineSchemaRequest, EntityResponse, FindRequest, FindResponse, ListRequest, ListResponse,
    MutateRequest, MutateResponse, ReportTimeSeriesRequest, RetrieveRequest,
};
use crate::schema::Schema;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod timed;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;
pub use timed::TimedTransport;

/// Request/response channel to the entity store.
///
/// Implementations report channel failures as [`EntityError::Transport`]
/// and leave application-level failures in the [`MutateResponse`].
///
/// [`EntityError::Transport`]: crate::EntityError::Transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Register a schema; the store answers with its canonical form
    async fn define_schema(&self, request: DefineSchemaRequest) -> EntityResult<Schema>;

    /// Apply one mutation to one entity
    async fn mutate(&self, request: MutateRequest) -> EntityResult<MutateResponse>;

    /// Load one entity
    async fn retrieve(&self, request: RetrieveRequest) -> EntityResult<EntityResponse>;

    /// Search entities of one schema
    async fn find(&self, request: FindRequest) -> EntityResult<FindResponse>;

    /// Read the members of a named active set
    async fn list(&self, request: ListRequest) -> EntityResult<ListResponse>;

    /// Record one point of an entity's time series, creating the entity if needed
    async fn report_time_series(
        &self,
        request: ReportTimeSeriesRequest,
    ) -> EntityResult<MutateResponse>;
}
