//! Item store abstraction

use bites_core::RangeResponse;

use crate::error::StorageError;

/// Result of [`ItemStore::insert_new`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was free and now holds the value
    Inserted,
    /// The key already existed; nothing was written
    Conflict,
}

/// Flat, ordered, byte-keyed persistence for items
///
/// Keys come from [`bites_core::key`]; values are opaque.
pub trait ItemStore: Send + Sync + 'static {
    /// Write `value` under `key` only if `key` is not present yet
    ///
    /// The existence check and the write form one atomic unit, so two
    /// concurrent inserts of the same key yield exactly one `Inserted`.
    fn insert_new(&self, key: &[u8], value: &[u8]) -> Result<InsertOutcome, StorageError>;

    /// Exact-key lookup
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Run [`scan_window`](crate::scan::scan_window) against one read snapshot
    fn scan_window(
        &self,
        prefix: &[u8],
        from_key: &[u8],
        to: u64,
    ) -> Result<RangeResponse, StorageError>;
}
