use async_trait::async_trait;
use std::sync::Arc;

use crate::config::TimingConfig;
use crate::error::EntityResult;
use crate::logging::features::{LogFeature, PerformanceTimer};
use crate::protocol::{
    DefineSchemaRequest, EntityResponse, FindRequest, FindResponse, ListRequest, ListResponse,
    MutateRequest, MutateResponse, ReportTimeSeriesRequest, RetrieveRequest,
};
use crate::schema::Schema;
use crate::transport::Transport;

/// Wraps a transport and logs the duration of every call
pub struct TimedTransport {
    inner: Arc<dyn Transport>,
    timing: TimingConfig,
}

impl TimedTransport {
    pub fn new(inner: Arc<dyn Transport>, timing: TimingConfig) -> Self {
        Self { inner, timing }
    }

    fn timer(&self, operation: String) -> PerformanceTimer {
        PerformanceTimer::new(LogFeature::Transport, operation).with_timing(&self.timing)
    }
}

#[async_trait]
impl Transport for TimedTransport {
    async fn define_schema(&self, request: DefineSchemaRequest) -> EntityResult<Schema> {
        let timer = self.timer(format!("define_schema {}", request.schema.type_name));
        let result = self.inner.define_schema(request).await;
        timer.finish();
        result
    }

    async fn mutate(&self, request: MutateRequest) -> EntityResult<MutateResponse> {
        let target = request.entity_id.clone().unwrap_or_else(|| "new".to_string());
        let timer = self.timer(format!("mutate {}", target));
        let result = self.inner.mutate(request).await;
        timer.finish();
        result
    }

    async fn retrieve(&self, request: RetrieveRequest) -> EntityResult<EntityResponse> {
        let timer = self.timer("retrieve".to_string());
        let result = self.inner.retrieve(request).await;
        timer.finish();
        result
    }

    async fn find(&self, request: FindRequest) -> EntityResult<FindResponse> {
        let timer = self.timer(format!("find {}", request.schema.key));
        let result = self.inner.find(request).await;
        timer.finish();
        result
    }

    async fn list(&self, request: ListRequest) -> EntityResult<ListResponse> {
        let timer = self.timer(format!("list {} from {}", request.schema.key, request.from_view));
        let result = self.inner.list(request).await;
        timer.finish();
        result
    }

    async fn report_time_series(
        &self,
        request: ReportTimeSeriesRequest,
    ) -> EntityResult<MutateResponse> {
        let timer = self.timer(format!("report_time_series {}", request.schema.key));
        let result = self.inner.report_time_series(request).await;
        timer.finish();
        result
    }
}
