//! In-process [`StoreClient`]
//!
//! Calls a colocated [`StorageService`] directly instead of going through a
//! bus. Replies are identical to what the service publishes on the bus.

use async_trait::async_trait;
use bites_core::{ClientError, IngestRequest, PointRequest, RangeRequest, Reply, StoreClient};
use tracing::warn;

use crate::service::StorageService;
use crate::store::ItemStore;

pub struct DirectClient<S> {
    service: StorageService<S>,
}

impl<S: ItemStore> DirectClient<S> {
    pub fn new(service: StorageService<S>) -> Self {
        Self { service }
    }

    async fn blocking<F>(&self, f: F) -> Result<Reply, ClientError>
    where
        F: FnOnce(&StorageService<S>) -> Reply + Send + 'static,
    {
        let service = self.service.clone();
        tokio::task::spawn_blocking(move || f(&service))
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}

#[async_trait]
impl<S: ItemStore> StoreClient for DirectClient<S> {
    async fn ingest(&self, request: IngestRequest) -> Result<(), ClientError> {
        // Fire-and-forget like a bus publish; the service logs the outcome
        let reply = self
            .blocking(move |service| service.handle_ingest(&request))
            .await?;
        if !reply.is_ok() {
            warn!(status = reply.status, "Direct ingest was not stored");
        }
        Ok(())
    }

    async fn point(&self, request: PointRequest) -> Result<Reply, ClientError> {
        self.blocking(move |service| service.handle_point(&request))
            .await
    }

    async fn range(&self, request: RangeRequest) -> Result<Reply, ClientError> {
        self.blocking(move |service| service.handle_range(&request))
            .await
    }
}
