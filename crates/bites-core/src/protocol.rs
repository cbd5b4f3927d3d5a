//! Bus protocol shared by the gateway and the storage service
//!
//! Messages are serialized with postcard. Replies carry a status in the HTTP
//! status-code space plus an opaque body.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::identity::ItemKind;

/// Ingest events, fire-and-forget
pub const NEW_STORE: &str = "new_store";

/// Point queries, request/reply
pub const REQUEST_STORE: &str = "request_store";

/// Range queries, request/reply
pub const SCAN_STORE: &str = "scan_store";

/// Upper bound on one gateway-side request/reply round trip
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reply statuses used by the storage service
pub mod status {
    pub const OK: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// Store a new item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub kind: ItemKind,
    pub conversation: String,
    pub start: u64,
    pub payload: Vec<u8>,
}

/// Fetch one item's payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRequest {
    pub kind: ItemKind,
    pub conversation: String,
    pub start: u64,
}

/// List the starts inside the inclusive window `[from, to]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRequest {
    pub conversation: String,
    pub kind: ItemKind,
    pub from: u64,
    pub to: u64,
}

/// Window contents plus the nearest starts on either side of it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeResponse {
    /// Greatest start strictly before `from`
    pub previous: Option<u64>,
    /// Starts in `[from, to]`, ascending
    pub items: Vec<u64>,
    /// Smallest start after `to`
    pub next: Option<u64>,
}

/// Answer to a request, in the HTTP status-code space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: status::OK,
            body,
        }
    }

    /// A non-success reply whose body is a human readable message
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: message.into().into_bytes(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == status::OK
    }
}

/// Serialize a protocol message for the bus
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, postcard::Error> {
    postcard::to_allocvec(message)
}

/// Deserialize a protocol message received from the bus
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, postcard::Error> {
    postcard::from_bytes(bytes)
}
