//! # JSON Snapshot Persistence
//!
//! The stores persist as two JSON documents, written whole on save and
//! read whole on load:
//!
//! - `splitease_orders.json` - every order
//! - `splitease_bills.json`  - every bill
//!
//! A missing file is an empty store (first launch). A file that exists but
//! does not parse is a hard [`SnapshotError::Corrupted`] error: the caller
//! decides whether to stop or call [`SnapshotStore::reset`], the store never
//! silently replaces real data with defaults.
//!
//! Writes go to a temp file in the same directory and rename into place,
//! so a crash mid-write leaves the previous snapshot intact.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use splitease_core::{Bill, Order};

/// Orders snapshot file name.
pub const ORDERS_FILE: &str = "splitease_orders.json";
/// Bills snapshot file name.
pub const BILLS_FILE: &str = "splitease_bills.json";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not valid snapshot JSON. Surfaced loudly;
    /// recovering means an explicit [`SnapshotStore::reset`].
    #[error("snapshot at {path} is corrupted: {source}")]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

// =============================================================================
// Snapshot Store
// =============================================================================

/// Reads and writes the two snapshot documents under one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SnapshotStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_orders(&self, orders: &[Order]) -> SnapshotResult<()> {
        self.save(ORDERS_FILE, orders)
    }

    pub fn load_orders(&self) -> SnapshotResult<Vec<Order>> {
        self.load(ORDERS_FILE)
    }

    pub fn save_bills(&self, bills: &[Bill]) -> SnapshotResult<()> {
        self.save(BILLS_FILE, bills)
    }

    pub fn load_bills(&self) -> SnapshotResult<Vec<Bill>> {
        self.load(BILLS_FILE)
    }

    /// Deletes both snapshot files. The recovery path for a corrupted
    /// snapshot, and the "clear all data" action.
    pub fn reset(&self) -> SnapshotResult<()> {
        for file in [ORDERS_FILE, BILLS_FILE] {
            let path = self.dir.join(file);
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Snapshot removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(SnapshotError::Io { path, source }),
            }
        }
        Ok(())
    }

    fn save<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> SnapshotResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(file);
        let json = serde_json::to_vec_pretty(value).map_err(|source| SnapshotError::Corrupted {
            path: path.clone(),
            source,
        })?;

        // Temp-and-rename keeps the old snapshot intact if we crash here.
        let tmp = self.dir.join(format!("{file}.tmp"));
        fs::write(&tmp, &json).map_err(|source| SnapshotError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| SnapshotError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), bytes = json.len(), "Snapshot written");
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, file: &str) -> SnapshotResult<Vec<T>> {
        let path = self.dir.join(file);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            // First launch: no snapshot, empty store.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(SnapshotError::Io { path, source }),
        };

        serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Corrupted { path, source })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use splitease_core::MenuCatalog;

    use crate::events::UpdateBus;
    use crate::orders::{NewOrder, NewOrderItem, OrderStore};

    fn temp_store() -> SnapshotStore {
        let dir = std::env::temp_dir().join(format!("splitease-test-{}", uuid::Uuid::new_v4()));
        SnapshotStore::new(dir)
    }

    fn sample_orders() -> Vec<Order> {
        let store = OrderStore::new(Arc::new(MenuCatalog::sample()), Arc::new(UpdateBus::new()));
        store
            .create_order(NewOrder {
                table_number: 7,
                customer_id: None,
                waiter_id: None,
                priority: splitease_core::OrderPriority::Normal,
                items: vec![NewOrderItem::new("margherita", 2)],
            })
            .unwrap();
        store.export()
    }

    #[test]
    fn test_missing_snapshot_is_empty_store() {
        let store = temp_store();
        assert!(store.load_orders().unwrap().is_empty());
        assert!(store.load_bills().unwrap().is_empty());
    }

    #[test]
    fn test_orders_round_trip() {
        let store = temp_store();
        let orders = sample_orders();

        store.save_orders(&orders).unwrap();
        let loaded = store.load_orders().unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, orders[0].id);
        assert_eq!(loaded[0].total_cents, orders[0].total_cents);
        assert_eq!(loaded[0].created_at, orders[0].created_at);

        store.reset().unwrap();
    }

    #[test]
    fn test_corrupted_snapshot_is_a_loud_error() {
        let store = temp_store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join(ORDERS_FILE), b"{not json!").unwrap();

        let err = store.load_orders();
        assert!(matches!(err, Err(SnapshotError::Corrupted { .. })));

        // Reset clears the bad file; the store is empty again, not defaulted.
        store.reset().unwrap();
        assert!(store.load_orders().unwrap().is_empty());
    }

    #[test]
    fn test_reset_on_empty_dir_is_fine() {
        let store = temp_store();
        store.reset().unwrap();
    }
}
