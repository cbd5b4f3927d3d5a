//! Storage service
//!
//! Owns the item store and answers the bus protocol:
//!
//! - `new_store`: ingest events, fire-and-forget (acknowledged only when the
//!   event carries a reply subject)
//! - `request_store`: point queries, one [`Reply`] per request
//! - `scan_store`: range queries, one [`Reply`] per request
//!
//! Every message is handled in its own task; store calls run on the blocking
//! pool.

use std::sync::Arc;

use bites_core::protocol::{self, NEW_STORE, REQUEST_STORE, SCAN_STORE, status};
use bites_core::{
    BusError, BusMessage, IngestRequest, ItemKind, MessageBus, PointRequest, RangeRequest,
    RangeResponse, Reply, key,
};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::ServiceError;
use crate::scan;
use crate::store::{InsertOutcome, ItemStore};

/// Subjects the service listens on
pub const SUBJECTS: [&str; 3] = [NEW_STORE, REQUEST_STORE, SCAN_STORE];

/// Ingest, point-get and scan over an [`ItemStore`]
pub struct StorageService<S> {
    store: Arc<S>,
}

impl<S> Clone for StorageService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: ItemStore> StorageService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Store a new item, refusing to replace an existing one
    pub fn ingest(
        &self,
        kind: ItemKind,
        conversation: &str,
        start: u64,
        payload: &[u8],
    ) -> Result<(), ServiceError> {
        let key = key::encode(kind, conversation, start)?;
        match self.store.insert_new(&key, payload)? {
            InsertOutcome::Inserted => {
                debug!(%kind, conversation, start, bytes = payload.len(), "Ingested item");
                Ok(())
            }
            InsertOutcome::Conflict => Err(ServiceError::Conflict(format!(
                "{kind}+{conversation}@{start}"
            ))),
        }
    }

    /// Fetch one item's payload
    pub fn get(
        &self,
        kind: ItemKind,
        conversation: &str,
        start: u64,
    ) -> Result<Vec<u8>, ServiceError> {
        let key = key::encode(kind, conversation, start)?;
        self.store
            .get(&key)?
            .ok_or_else(|| ServiceError::NotFound(format!("{kind}+{conversation}@{start}")))
    }

    /// Window scan with previous/next hints
    pub fn scan(
        &self,
        kind: ItemKind,
        conversation: &str,
        from: u64,
        to: u64,
    ) -> Result<RangeResponse, ServiceError> {
        scan::scan(self.store.as_ref(), kind, conversation, from, to)
    }

    pub fn handle_ingest(&self, req: &IngestRequest) -> Reply {
        match self.ingest(req.kind, &req.conversation, req.start, &req.payload) {
            Ok(()) => Reply::ok(Vec::new()),
            Err(e) => failure_reply(e),
        }
    }

    pub fn handle_point(&self, req: &PointRequest) -> Reply {
        match self.get(req.kind, &req.conversation, req.start) {
            Ok(payload) => Reply::ok(payload),
            Err(e) => failure_reply(e),
        }
    }

    pub fn handle_range(&self, req: &RangeRequest) -> Reply {
        let response = match self.scan(req.kind, &req.conversation, req.from, req.to) {
            Ok(response) => response,
            Err(e) => return failure_reply(e),
        };
        match protocol::encode(&response) {
            Ok(body) => Reply::ok(body),
            Err(e) => {
                error!(error = %e, "Failed to encode range response");
                Reply::error(status::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }

    /// Decode a message received on `subject` and handle it
    pub fn dispatch(&self, subject: &str, payload: &[u8]) -> Reply {
        let decoded = match subject {
            NEW_STORE => protocol::decode(payload).map(|req| self.handle_ingest(&req)),
            REQUEST_STORE => protocol::decode(payload).map(|req| self.handle_point(&req)),
            SCAN_STORE => protocol::decode(payload).map(|req| self.handle_range(&req)),
            other => {
                warn!(subject = other, "Message on unexpected subject");
                return Reply::error(status::BAD_REQUEST, format!("unknown subject {other}"));
            }
        };

        decoded.unwrap_or_else(|e| {
            warn!(subject, error = %e, "Undecodable message");
            Reply::error(status::BAD_REQUEST, format!("malformed message: {e}"))
        })
    }

    /// Subscribe to the store subjects and serve until the bus closes them
    pub async fn run<B>(self, bus: Arc<B>) -> Result<(), BusError>
    where
        B: MessageBus + ?Sized + 'static,
    {
        let mut subscriptions = Vec::with_capacity(SUBJECTS.len());
        for subject in SUBJECTS {
            subscriptions.push(bus.subscribe(subject).await?);
        }
        info!(subjects = ?SUBJECTS, "Storage service listening");

        let mut listeners = JoinSet::new();
        for mut subscription in subscriptions {
            let service = self.clone();
            let bus = bus.clone();
            listeners.spawn(async move {
                while let Some(message) = subscription.next().await {
                    let service = service.clone();
                    let bus = bus.clone();
                    tokio::spawn(async move { service.process(bus.as_ref(), message).await });
                }
                debug!(subject = subscription.subject(), "Subscription closed");
            });
        }

        while listeners.join_next().await.is_some() {}
        info!("Storage service stopped");
        Ok(())
    }

    /// Handle one message and publish its reply, if one is expected
    async fn process<B: MessageBus + ?Sized>(self, bus: &B, message: BusMessage) {
        let BusMessage {
            subject,
            payload,
            reply,
        } = message;

        let worker = self.clone();
        let worker_subject = subject.clone();
        let answer =
            match tokio::task::spawn_blocking(move || worker.dispatch(&worker_subject, &payload))
                .await
            {
                Ok(answer) => answer,
                Err(e) => {
                    error!(subject = %subject, error = %e, "Storage worker failed");
                    Reply::error(status::INTERNAL_SERVER_ERROR, "storage worker failed")
                }
            };

        let Some(reply_to) = reply else {
            if subject != NEW_STORE {
                warn!(subject = %subject, "Request without reply subject dropped");
            }
            return;
        };

        let body = match protocol::encode(&answer) {
            Ok(body) => body,
            Err(e) => {
                error!(subject = %subject, error = %e, "Failed to encode reply");
                return;
            }
        };
        if let Err(e) = bus.publish(&reply_to, body).await {
            warn!(subject = %subject, reply_to = %reply_to, error = %e, "Failed to publish reply");
        }
    }
}

/// Log a failed operation at a level matching its cause and build its reply
fn failure_reply(err: ServiceError) -> Reply {
    match &err {
        ServiceError::Storage(e) => error!(error = %e, "Storage failure"),
        ServiceError::Conflict(id) => warn!(item = %id, "Refusing to overwrite stored item"),
        ServiceError::InvalidIdentity(msg) => warn!(reason = %msg, "Rejected request"),
        ServiceError::NotFound(id) => debug!(item = %id, "Item not found"),
    }
    Reply::error(err.status(), err.to_string())
}
