//! # Bites Core
//!
//! Shared contract between the storage service and the HTTP gateway.
//!
//! ## Key Types
//!
//! - [`ItemKind`], [`ConversationId`], [`ItemId`]: identity of a stored item
//! - [`key`]: order-preserving byte key codec for the flat item table
//! - [`protocol`]: bus topics, request/response messages and reply statuses
//!
//! ## Key Traits
//!
//! - [`MessageBus`]: publish/subscribe with request-reply over subjects
//! - [`StoreClient`]: "submit ingest" / "query" seam used by the gateway,
//!   satisfied either by a bus round trip ([`BusClient`]) or an in-process call

pub mod bus;
pub mod client;
pub mod error;
pub mod identity;
pub mod key;
pub mod local_bus;
pub mod protocol;

// Re-export main types
pub use bus::{BusMessage, MessageBus, Subscription};
pub use client::{BusClient, StoreClient};
pub use error::*;
pub use identity::{ConversationId, ItemId, ItemKind};
pub use local_bus::LocalBus;
pub use protocol::{IngestRequest, PointRequest, RangeRequest, RangeResponse, Reply};
