//! NATS adapter
//!
//! Subjects map one-to-one onto NATS subjects. Request/reply uses NATS'
//! own inbox mechanism; subscriptions are forwarded into the channel-backed
//! [`Subscription`] type shared with the in-process bus.

use std::time::Duration;

use async_nats::client::RequestErrorKind;
use async_trait::async_trait;
use bites_core::{BusError, BusMessage, MessageBus, Subscription};
use futures_lite::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

/// Undelivered messages buffered per subscription
const SUBSCRIPTION_BUFFER: usize = 1024;

/// [`MessageBus`] over a NATS connection
#[derive(Clone)]
pub struct NatsBus {
    client: async_nats::Client,
}

impl NatsBus {
    /// Connect to a NATS server, e.g. `nats://localhost:4222`
    #[instrument]
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = async_nats::ConnectOptions::new()
            .name("bites")
            .connect(url)
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        info!("Connected to NATS");
        Ok(Self::from_client(client))
    }

    /// Wrap an already connected client
    pub fn from_client(client: async_nats::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }
}

#[async_trait]
impl MessageBus for NatsBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| BusError::Transport(e.to_string()))
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        let mut subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let name = subject.to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    next = subscriber.next() => {
                        let Some(message) = next else { break };
                        let forwarded = BusMessage {
                            subject: message.subject.to_string(),
                            payload: message.payload.to_vec(),
                            reply: message.reply.map(|r| r.to_string()),
                        };
                        if tx.send(forwarded).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(subject = %name, "NATS subscription forwarder stopped");
        });

        Ok(Subscription::new(subject, rx))
    }

    async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, BusError> {
        let pending = self.client.request(subject.to_string(), payload.into());
        match tokio::time::timeout(timeout, pending).await {
            Err(_) => Err(BusError::Timeout),
            Ok(Ok(message)) => Ok(message.payload.to_vec()),
            Ok(Err(e)) => Err(match e.kind() {
                RequestErrorKind::TimedOut => BusError::Timeout,
                RequestErrorKind::NoResponders => BusError::NoResponders(subject.to_string()),
                _ => BusError::Transport(e.to_string()),
            }),
        }
    }
}
