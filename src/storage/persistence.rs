//! Snapshot files and classic store creation for RustMemDB store directories

use super::layout::StoreLayout;
use super::metadata::{StoreMetadata, write_metadata};
use crate::core::error::{RestoreError, Result, io_err};
use crate::core::RecordFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// Store Snapshot
// ============================================================================

/// Checkpointed image of every table in a store. Rows are opaque encoded records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub last_tx_id: u64,
    pub created_at_ms: u64,
    pub tables: BTreeMap<String, Vec<Vec<u8>>>,
}

impl StoreSnapshot {
    pub fn new(
        record_format: RecordFormat,
        last_tx_id: u64,
        tables: BTreeMap<String, Vec<Vec<u8>>>,
    ) -> Self {
        let created_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            version: record_format.snapshot_version(),
            last_tx_id,
            created_at_ms,
            tables,
        }
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            fs::create_dir_all(parent).map_err(io_err("Failed to create snapshot directory", parent))?;
        }
        let temp_path = self.snapshot_path.with_extension("tmp");
        let temp_file = File::create(&temp_path).map_err(io_err("Failed to create temp file", &temp_path))?;
        let mut writer = BufWriter::new(temp_file);
        let serialized = rmp_serde::to_vec(snapshot)
            .map_err(|e| RestoreError::Io(format!("Failed to serialize snapshot: {}", e)))?;
        writer.write_all(&serialized).map_err(io_err("Failed to write snapshot", &temp_path))?;
        writer.flush().map_err(io_err("Failed to flush snapshot", &temp_path))?;
        writer.get_mut().sync_all().map_err(io_err("Failed to sync snapshot", &temp_path))?;
        fs::rename(&temp_path, &self.snapshot_path).map_err(io_err("Failed to rename snapshot", &self.snapshot_path))?;
        Ok(())
    }

    /// Loads the snapshot; `Ok(None)` if absent.
    ///
    /// A file that cannot be read is `Io`; one that reads but does not decode
    /// (truncated, garbled) is `IncompatibleStore`.
    pub fn load(&self) -> Result<Option<StoreSnapshot>> {
        let data = match fs::read(&self.snapshot_path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err("Failed to read snapshot", &self.snapshot_path)(e)),
        };
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&data).map_err(|e| {
            RestoreError::incompatible(&self.snapshot_path, format!("snapshot cannot be decoded: {}", e))
        })?;
        Ok(Some(snapshot))
    }
}

/// Number of bytes in the write-ahead log, zero if there is none.
pub fn wal_len(layout: &StoreLayout) -> Result<u64> {
    let path = layout.wal_path();
    match fs::metadata(&path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(io_err("Failed to inspect write-ahead log", &path)(e)),
    }
}

// ============================================================================
// Classic Store
// ============================================================================

/// Writes a checkpointed standalone store into `root`, the shape a backup has.
///
/// Creates the directory if needed and leaves an empty write-ahead log.
pub fn create_classic_store<P: AsRef<Path>>(
    root: P,
    record_format: RecordFormat,
    last_tx_id: u64,
    tables: BTreeMap<String, Vec<Vec<u8>>>,
) -> Result<StoreMetadata> {
    let layout = StoreLayout::new(root);
    fs::create_dir_all(layout.root()).map_err(io_err("Failed to create store directory", layout.root()))?;

    let snapshot = StoreSnapshot::new(record_format, last_tx_id, tables);
    SnapshotManager::new(layout.snapshot_path()).save(&snapshot)?;

    let wal_path = layout.wal_path();
    File::create(&wal_path).map_err(io_err("Failed to create write-ahead log", &wal_path))?;

    let metadata = StoreMetadata::classic(record_format, last_tx_id);
    write_metadata(&layout, &metadata)?;
    Ok(metadata)
}
