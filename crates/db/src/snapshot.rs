//! JSON snapshots of the in-memory store.
//!
//! A snapshot file lets a long-running worker start from existing ledger
//! state and keep what it materializes across restarts. Writes go to a
//! temporary file that is renamed over the target, so a crash leaves either
//! the old snapshot or the new one.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use fintrack_core::ledger::{Account, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Every account and transaction held by a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Accounts, oldest first.
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Transactions, oldest first.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Reads a snapshot, or an empty one if `path` does not exist.
///
/// # Errors
///
/// Returns `Snapshot` if the file cannot be opened or parsed.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<StoreSnapshot, StoreError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(StoreSnapshot::default());
    }

    let file = File::open(path)
        .map_err(|e| StoreError::Snapshot(format!("Failed to open {}: {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| StoreError::Snapshot(format!("Failed to parse {}: {e}", path.display())))
}

/// Writes a snapshot atomically (temp file, then rename).
///
/// # Errors
///
/// Returns `Snapshot` if any step of the write fails. The previous file, if
/// any, is left intact.
pub fn write_snapshot(path: impl AsRef<Path>, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            StoreError::Snapshot(format!("Failed to create {}: {e}", parent.display()))
        })?;
    }

    let temp_path = path.with_extension("json.tmp");
    let file = File::create(&temp_path)
        .map_err(|e| StoreError::Snapshot(format!("Failed to create temp file: {e}")))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, snapshot)
        .map_err(|e| StoreError::Snapshot(format!("Failed to serialize snapshot: {e}")))?;
    writer
        .flush()
        .map_err(|e| StoreError::Snapshot(format!("Failed to flush snapshot: {e}")))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| StoreError::Snapshot(format!("Failed to sync snapshot: {e}")))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StoreError::Snapshot(format!("Failed to rename temp file: {e}"))
    })
}
