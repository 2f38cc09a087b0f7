use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::Error;
use crate::lifecycle::SnapshotResource;
use crate::model::Record;
use crate::repository::{RecordService, RecordSource};
use crate::response::{records_response, ProxyRequest, ProxyResponse};

/// Request handler: reads every record of the configured table and returns
/// them as a JSON array.
pub struct RecordHandler<S> {
    service: RecordService<S>,
    initialization_type: Option<String>,
}

impl<S: RecordSource> RecordHandler<S> {
    pub fn new(service: RecordService<S>, initialization_type: Option<String>) -> Self {
        Self {
            service,
            initialization_type,
        }
    }

    pub fn service(&self) -> &RecordService<S> {
        &self.service
    }

    pub async fn handle(&self, request: &ProxyRequest) -> ProxyResponse {
        info!(
            method = request.http_method.as_deref().unwrap_or("-"),
            path = request.path.as_deref().unwrap_or("-"),
            "handle_request started"
        );
        info!(
            "aws_lambda_initialization_type: {}",
            self.initialization_type.as_deref().unwrap_or("unknown")
        );

        let records = self.records().await;
        let response = records_response(&records);

        info!(status = response.status_code, "handle_request finished");
        response
    }

    pub async fn records(&self) -> Vec<Record> {
        self.service.read().await
    }

    // Runs a priming request end to end, then drops the connection it
    // opened so the snapshot never carries a live socket.
    async fn prime(&self, request: &ProxyRequest) -> Result<(), Error> {
        let response = self.handle(request).await;
        self.service.reset().await;
        priming_outcome(&response)
    }
}

fn priming_outcome(response: &ProxyResponse) -> Result<(), Error> {
    match response.status_code {
        200 => Ok(()),
        status => Err(Error::Hook {
            hook: "before_snapshot",
            reason: format!("priming request answered {}", status),
        }),
    }
}

// Invoke priming: the handler registers itself and, before the snapshot,
// runs an empty request end to end.
#[async_trait]
impl<S: RecordSource + 'static> SnapshotResource for RecordHandler<S> {
    fn name(&self) -> &'static str {
        "invoke-priming"
    }

    async fn before_snapshot(&self) -> Result<(), Error> {
        self.prime(&ProxyRequest::default()).await
    }

    async fn after_restore(&self) -> Result<(), Error> {
        self.service.reset().await;
        Ok(())
    }
}

// Manual priming: owns a hand-built request and drives the shared handler
pub struct ManualPrimer<S> {
    handler: Arc<RecordHandler<S>>,
    request: ProxyRequest,
}

impl<S: RecordSource> ManualPrimer<S> {
    pub fn new(handler: Arc<RecordHandler<S>>) -> Self {
        Self {
            handler,
            request: ProxyRequest::get("/priming"),
        }
    }

    pub fn request(&self) -> &ProxyRequest {
        &self.request
    }
}

#[async_trait]
impl<S: RecordSource + 'static> SnapshotResource for ManualPrimer<S> {
    fn name(&self) -> &'static str {
        "manual-priming"
    }

    async fn before_snapshot(&self) -> Result<(), Error> {
        self.handler.prime(&self.request).await
    }

    async fn after_restore(&self) -> Result<(), Error> {
        self.handler.service().reset().await;
        Ok(())
    }
}
