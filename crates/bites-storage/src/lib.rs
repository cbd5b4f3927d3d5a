//! # Bites Storage
//!
//! Owns the durable state of the Bites segment store.
//!
//! ## Features
//!
//! - **ItemStore trait**: flat ordered byte-keyed store with atomic insert-if-absent
//! - **RedbItemStore**: redb-backed implementation for production
//! - **InMemoryItemStore**: `BTreeMap` implementation for tests and ephemeral runs
//! - **Range scanner**: window scans with previous/next hints over [`scan::OrderedKeys`]
//! - **StorageService**: answers `new_store`, `request_store` and `scan_store` on a bus
//! - **DirectClient**: in-process `StoreClient` for colocated deployments
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bites_core::{ItemKind, LocalBus};
//! use bites_storage::{InMemoryItemStore, StorageService};
//!
//! let service = StorageService::new(Arc::new(InMemoryItemStore::new()));
//! service.ingest(ItemKind::Segment, "conv1", 100, b"RIFF")?;
//!
//! let resp = service.scan(ItemKind::Segment, "conv1", 0, 200)?;
//! assert_eq!(resp.items, vec![100]);
//!
//! // Serve the bus protocol
//! tokio::spawn(service.run(Arc::new(LocalBus::new())));
//! ```

pub mod direct;
pub mod error;
pub mod memory;
pub mod redb_store;
pub mod scan;
pub mod service;
pub mod store;

// Re-exports
pub use direct::DirectClient;
pub use error::{ServiceError, StorageError};
pub use memory::InMemoryItemStore;
pub use redb_store::{RedbItemStore, RedbStoreConfig};
pub use service::StorageService;
pub use store::{InsertOutcome, ItemStore};
