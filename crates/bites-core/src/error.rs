//! Error types for the Bites core crate

use thiserror::Error;

/// Errors produced by the key codec and identity validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Unknown kind or malformed conversation identifier
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// A stored key could not be split back into its parts
    #[error("Key parse error: {0}")]
    KeyParse(String),
}

/// Errors raised by a message bus implementation
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Request timed out")]
    Timeout,

    #[error("No responders for subject {0}")]
    NoResponders(String),

    #[error("Bus closed")]
    Closed,

    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Errors raised by a [`StoreClient`](crate::StoreClient)
///
/// These are failures to obtain an answer at all. An answered request with a
/// non-200 status is a [`Reply`](crate::Reply), not an error.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Store request timed out")]
    Timeout,

    #[error("Store transport failure: {0}")]
    Transport(String),

    #[error("Codec error: {0}")]
    Codec(String),
}

impl From<BusError> for ClientError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::Timeout => ClientError::Timeout,
            other => ClientError::Transport(other.to_string()),
        }
    }
}

impl From<postcard::Error> for ClientError {
    fn from(err: postcard::Error) -> Self {
        ClientError::Codec(err.to_string())
    }
}
