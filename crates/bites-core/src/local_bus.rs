//! In-process message bus
//!
//! [`LocalBus`] delivers messages over tokio channels. It is used when the
//! storage service and gateway run in the same process, and by tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bites_core::{LocalBus, MessageBus};
//!
//! let bus = LocalBus::new();
//! let mut sub = bus.subscribe("request_store").await?;
//!
//! tokio::spawn(async move {
//!     while let Some(msg) = sub.next().await {
//!         if let Some(reply) = msg.reply {
//!             bus.publish(&reply, b"pong".to_vec()).await.ok();
//!         }
//!     }
//! });
//! ```

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::bus::{BusMessage, MessageBus, Subscription};
use crate::error::BusError;

/// Prefix of the private subjects requesters wait on
pub const INBOX_PREFIX: &str = "_INBOX.";

/// In-memory subject router
///
/// Every subscriber of a subject receives each message published on it.
/// Messages published on a subject without subscribers are dropped.
pub struct LocalBus {
    /// Subject -> subscriber channels
    subscribers: DashMap<String, Vec<mpsc::Sender<BusMessage>>>,
    /// Reply subject -> waiting requester
    inboxes: DashMap<String, oneshot::Sender<Vec<u8>>>,
    buffer_size: usize,
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBus {
    pub fn new() -> Self {
        Self::with_buffer_size(1024)
    }

    /// Create a bus whose subscriber channels hold `buffer_size` messages
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            inboxes: DashMap::new(),
            buffer_size,
        }
    }

    /// Number of live subscribers on a subject
    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.subscribers
            .get(subject)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Number of requests currently waiting for a reply
    pub fn pending_requests(&self) -> usize {
        self.inboxes.len()
    }

    async fn deliver(
        &self,
        subject: &str,
        payload: Vec<u8>,
        reply: Option<String>,
    ) -> Result<usize, BusError> {
        if let Some((_, waiter)) = self.inboxes.remove(subject) {
            // The requester may have timed out already
            let delivered = waiter.send(payload).is_ok();
            return Ok(usize::from(delivered));
        }

        // Clone the senders so no map guard is held across an await
        let senders: Vec<mpsc::Sender<BusMessage>> = match self.subscribers.get(subject) {
            Some(subs) => subs.clone(),
            None => {
                trace!(subject, "No subscribers, dropping message");
                return Ok(0);
            }
        };

        let message = BusMessage {
            subject: subject.to_string(),
            payload,
            reply,
        };

        let mut delivered = 0;
        let mut saw_closed = false;
        for tx in senders {
            if tx.send(message.clone()).await.is_ok() {
                delivered += 1;
            } else {
                saw_closed = true;
            }
        }

        if saw_closed {
            if let Some(mut subs) = self.subscribers.get_mut(subject) {
                subs.retain(|tx| !tx.is_closed());
            }
        }

        Ok(delivered)
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.deliver(subject, payload, None).await.map(|_| ())
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        self.subscribers
            .entry(subject.to_string())
            .or_default()
            .push(tx);
        Ok(Subscription::new(subject, rx))
    }

    async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, BusError> {
        if self.subscriber_count(subject) == 0 {
            return Err(BusError::NoResponders(subject.to_string()));
        }

        let inbox = format!("{INBOX_PREFIX}{}", uuid::Uuid::new_v4().simple());
        let (tx, rx) = oneshot::channel();
        self.inboxes.insert(inbox.clone(), tx);

        if let Err(e) = self.deliver(subject, payload, Some(inbox.clone())).await {
            self.inboxes.remove(&inbox);
            return Err(e);
        }

        let outcome = tokio::time::timeout(timeout, rx).await;
        self.inboxes.remove(&inbox);

        match outcome {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(_)) => Err(BusError::Closed),
            Err(_) => Err(BusError::Timeout),
        }
    }
}
