//! Store-level metadata: identity, record format and the conversion record.

use super::layout::StoreLayout;
use crate::core::error::{RestoreError, Result, io_err};
use crate::core::{ClusterSeed, RecordFormat};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

pub const METADATA_VERSION: u32 = 1;

/// Marks a store as the founding replica of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub record_format: RecordFormat,
    pub seed: ClusterSeed,
    pub converted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub version: u32,
    pub store_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub record_format: RecordFormat,
    pub last_tx_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionRecord>,
}

impl StoreMetadata {
    /// Fresh metadata for a standalone store.
    pub fn classic(record_format: RecordFormat, last_tx_id: u64) -> Self {
        Self {
            version: METADATA_VERSION,
            store_id: Uuid::new_v4(),
            created_at: Utc::now(),
            record_format,
            last_tx_id,
            conversion: None,
        }
    }

    pub fn is_converted(&self) -> bool {
        self.conversion.is_some()
    }
}

/// Reads `rustmemodb.meta`, returning `None` if the store has none.
pub fn read_metadata(layout: &StoreLayout) -> Result<Option<StoreMetadata>> {
    let path = layout.metadata_path();
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err("Failed to read store metadata", &path)(err)),
    };

    serde_json::from_slice::<StoreMetadata>(&bytes)
        .map(Some)
        .map_err(|err| {
            RestoreError::incompatible(
                layout.root(),
                format!("unreadable store metadata: {}", err),
            )
        })
}

pub fn write_metadata(layout: &StoreLayout, metadata: &StoreMetadata) -> Result<()> {
    write_json_atomic(&layout.metadata_path(), metadata)
}

/// Writes `value` next to `path` in a temp file, syncs it, and renames it over `path`.
///
/// Readers observe either the previous contents or the complete new document.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| RestoreError::Io(format!("'{}' has no parent directory", path.display())))?;

    let json = serde_json::to_vec_pretty(value)
        .map_err(|err| RestoreError::Io(format!("Failed to serialize '{}': {}", path.display(), err)))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(io_err("Failed to create temp file in", dir))?;
    temp.write_all(&json)
        .map_err(io_err("Failed to write temp file for", path))?;
    temp.as_file()
        .sync_all()
        .map_err(io_err("Failed to sync temp file for", path))?;
    temp.persist(path)
        .map_err(|err| io_err("Failed to replace", path)(err.error))?;
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err("Failed to read", path)(err)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|err| RestoreError::Io(format!("Failed to parse '{}': {}", path.display(), err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_metadata_reads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(temp_dir.path());
        assert!(read_metadata(&layout).unwrap().is_none());
    }

    #[test]
    fn test_write_replaces_existing_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(temp_dir.path());

        let mut metadata = StoreMetadata::classic(RecordFormat::Standard, 7);
        write_metadata(&layout, &metadata).unwrap();

        metadata.conversion = Some(ConversionRecord {
            record_format: RecordFormat::Standard,
            seed: ClusterSeed::new(Uuid::new_v4(), metadata.store_id, 7),
            converted_at: Utc::now(),
        });
        write_metadata(&layout, &metadata).unwrap();

        let loaded = read_metadata(&layout).unwrap().unwrap();
        assert!(loaded.is_converted());
        assert_eq!(loaded, metadata);

        // Only the metadata file is left behind, no stray temp files.
        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_garbled_metadata_is_incompatible() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(temp_dir.path());
        fs::write(layout.metadata_path(), b"{\"version\": 1, \"store_").unwrap();

        let err = read_metadata(&layout).unwrap_err();
        assert!(matches!(err, RestoreError::IncompatibleStore { .. }));
    }
}
