//! In-memory item store
//!
//! Suitable for tests and for running the service without a database file.
//!
//! All items sit in one `BTreeMap` behind a single lock, so inserts are
//! serialized against each other and against scans. That gives per-key
//! check-then-set for free at the cost of no write parallelism; the redb
//! store has the same single-writer shape.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use bites_core::RangeResponse;
use parking_lot::RwLock;
use tracing::trace;

use crate::error::StorageError;
use crate::scan::scan_window;
use crate::store::{InsertOutcome, ItemStore};

/// [`ItemStore`] over a `BTreeMap` behind a read/write lock
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items across all timelines
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Store a raw key, bypassing the key codec
    pub fn insert_raw(&self, key: Vec<u8>, value: Vec<u8>) {
        self.items.write().insert(key, value);
    }
}

impl ItemStore for InMemoryItemStore {
    fn insert_new(&self, key: &[u8], value: &[u8]) -> Result<InsertOutcome, StorageError> {
        let mut items = self.items.write();
        match items.entry(key.to_vec()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(value.to_vec());
                trace!(key = %hex::encode(key), "Inserted item");
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.items.read().get(key).cloned())
    }

    fn scan_window(
        &self,
        prefix: &[u8],
        from_key: &[u8],
        to: u64,
    ) -> Result<RangeResponse, StorageError> {
        let items = self.items.read();
        scan_window(&*items, prefix, from_key, to)
    }
}
