//! Message bus abstraction
//!
//! The [`MessageBus`] trait models a subject-based publish/subscribe broker
//! with request/reply: a requester publishes with a private reply subject and
//! waits, a responder answers by publishing to [`BusMessage::reply`].
//!
//! ## Implementations
//!
//! - [`LocalBus`](crate::LocalBus): in-process bus for colocated deployments and tests
//! - `NatsBus`: NATS client adapter (in the bites-transport crate)

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::BusError;

/// One message delivered to a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Subject the message was published on
    pub subject: String,
    /// Opaque payload
    pub payload: Vec<u8>,
    /// Subject the sender waits on for an answer, if any
    pub reply: Option<String>,
}

/// Stream of messages for one subscribed subject
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    subject: String,
    rx: mpsc::Receiver<BusMessage>,
}

impl Subscription {
    pub fn new(subject: impl Into<String>, rx: mpsc::Receiver<BusMessage>) -> Self {
        Self {
            subject: subject.into(),
            rx,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Wait for the next message; `None` once the bus side is gone
    pub async fn next(&mut self) -> Option<BusMessage> {
        self.rx.recv().await
    }
}

/// Subject-based publish/subscribe with request/reply
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish without waiting for any answer
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError>;

    /// Receive every message subsequently published on `subject`
    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError>;

    /// Publish and wait for exactly one answer
    ///
    /// The wait is bounded by `timeout`. Expiry only stops the wait; a
    /// responder that is still working is not notified.
    ///
    /// # Errors
    ///
    /// [`BusError::Timeout`] when no answer arrives in time,
    /// [`BusError::NoResponders`] when nobody listens on `subject`.
    async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, BusError>;
}

#[async_trait]
impl<B: MessageBus + ?Sized> MessageBus for std::sync::Arc<B> {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        (**self).publish(subject, payload).await
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        (**self).subscribe(subject).await
    }

    async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, BusError> {
        (**self).request(subject, payload, timeout).await
    }
}
