//! redb-backed item store
//!
//! Segments and annotations share one flat table; the key codec keeps every
//! timeline contiguous and ordered by start.

use std::path::PathBuf;
use std::sync::Arc;

use bites_core::RangeResponse;
use redb::{Database, ReadOnlyTable, ReadableTable, TableDefinition};
use tracing::{debug, info, instrument};

use crate::error::StorageError;
use crate::scan::{KeyVisitor, OrderedKeys, scan_window};
use crate::store::{InsertOutcome, ItemStore};

// Key: encoded item key, Value: opaque payload
pub const ITEMS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("items");

/// Configuration for the redb item store
#[derive(Debug, Clone)]
pub struct RedbStoreConfig {
    /// Path to the database file
    pub db_path: PathBuf,
}

impl Default for RedbStoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("/tmp/bites/bites.redb"),
        }
    }
}

/// [`ItemStore`] persisted in a redb database file
pub struct RedbItemStore {
    db: Arc<Database>,
    config: RedbStoreConfig,
}

impl RedbItemStore {
    /// Open or create the database
    #[instrument(skip(config), fields(path = %config.db_path.display()))]
    pub fn open(config: RedbStoreConfig) -> Result<Self, StorageError> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&config.db_path)?;

        info!("Opened redb database");

        let store = Self {
            db: Arc::new(db),
            config,
        };
        store.init_tables()?;

        Ok(store)
    }

    /// Create the items table so read transactions can always open it
    fn init_tables(&self) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write()?;
        write_txn.open_table(ITEMS)?;
        write_txn.commit()?;

        debug!("Initialized redb tables");
        Ok(())
    }

    pub fn config(&self) -> &RedbStoreConfig {
        &self.config
    }
}

impl ItemStore for RedbItemStore {
    fn insert_new(&self, key: &[u8], value: &[u8]) -> Result<InsertOutcome, StorageError> {
        let write_txn = self.db.begin_write()?;

        let inserted = {
            let mut table = write_txn.open_table(ITEMS)?;
            let exists = table.get(key)?.is_some();
            if !exists {
                table.insert(key, value)?;
            }
            !exists
        };

        if inserted {
            write_txn.commit()?;
            debug!(key = %hex::encode(key), bytes = value.len(), "Inserted item");
            Ok(InsertOutcome::Inserted)
        } else {
            write_txn.abort()?;
            Ok(InsertOutcome::Conflict)
        }
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ITEMS)?;

        let value = table.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn scan_window(
        &self,
        prefix: &[u8],
        from_key: &[u8],
        to: u64,
    ) -> Result<RangeResponse, StorageError> {
        // Both walks read the same snapshot
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ITEMS)?;
        scan_window(&RedbKeys { table: &table }, prefix, from_key, to)
    }
}

/// Key walks over one read-only table snapshot
struct RedbKeys<'t> {
    table: &'t ReadOnlyTable<&'static [u8], &'static [u8]>,
}

impl OrderedKeys for RedbKeys<'_> {
    fn walk_back(&self, from: &[u8], visit: &mut KeyVisitor<'_>) -> Result<(), StorageError> {
        for entry in self.table.range(..=from)?.rev() {
            let (key, _) = entry?;
            if visit(key.value()).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn walk_forward(&self, from: &[u8], visit: &mut KeyVisitor<'_>) -> Result<(), StorageError> {
        for entry in self.table.range(from..)? {
            let (key, _) = entry?;
            if visit(key.value()).is_break() {
                break;
            }
        }
        Ok(())
    }
}
