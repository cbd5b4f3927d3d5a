//! Client seam between the gateway and the storage service
//!
//! [`StoreClient`] is what the gateway talks to. [`BusClient`] satisfies it
//! with bus round trips; a colocated deployment can satisfy it with direct
//! calls into the storage service instead.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::bus::MessageBus;
use crate::error::ClientError;
use crate::protocol::{
    self, IngestRequest, NEW_STORE, PointRequest, REQUEST_STORE, REQUEST_TIMEOUT, RangeRequest,
    Reply, SCAN_STORE,
};

/// Submit ingests and run queries against the store
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Hand an item to the store without waiting for the outcome
    async fn ingest(&self, request: IngestRequest) -> Result<(), ClientError>;

    /// Fetch one item; the reply body is the payload on success
    async fn point(&self, request: PointRequest) -> Result<Reply, ClientError>;

    /// Scan a window; the reply body is a postcard [`RangeResponse`](crate::RangeResponse)
    async fn range(&self, request: RangeRequest) -> Result<Reply, ClientError>;
}

/// [`StoreClient`] backed by a [`MessageBus`]
pub struct BusClient<B> {
    bus: B,
    timeout: Duration,
}

impl<B: MessageBus> BusClient<B> {
    /// Create a client using the default request timeout
    pub fn new(bus: B) -> Self {
        Self::with_timeout(bus, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(bus: B, timeout: Duration) -> Self {
        Self { bus, timeout }
    }

    async fn call(&self, subject: &str, payload: Vec<u8>) -> Result<Reply, ClientError> {
        let answer = self.bus.request(subject, payload, self.timeout).await?;
        let reply: Reply = protocol::decode(&answer)?;
        debug!(subject, status = reply.status, "Store replied");
        Ok(reply)
    }
}

#[async_trait]
impl<B: MessageBus> StoreClient for BusClient<B> {
    async fn ingest(&self, request: IngestRequest) -> Result<(), ClientError> {
        let payload = protocol::encode(&request)?;
        self.bus.publish(NEW_STORE, payload).await?;
        Ok(())
    }

    async fn point(&self, request: PointRequest) -> Result<Reply, ClientError> {
        self.call(REQUEST_STORE, protocol::encode(&request)?).await
    }

    async fn range(&self, request: RangeRequest) -> Result<Reply, ClientError> {
        self.call(SCAN_STORE, protocol::encode(&request)?).await
    }
}
