use crate::core::error::{RestoreError, Result};
use crate::core::RecordFormat;
use crate::storage::{METADATA_VERSION, SnapshotManager, StoreLayout, StoreMetadata, read_metadata, wal_len};

/// Read-only eligibility check run before a store is converted.
pub trait ConversionVerifier {
    /// Returns the store's metadata if it is an unconverted classic store laid
    /// out in `record_format`. Must not modify anything on disk.
    fn verify(&self, layout: &StoreLayout, record_format: RecordFormat) -> Result<StoreMetadata>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicStoreVerifier;

impl ClassicStoreVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl ConversionVerifier for ClassicStoreVerifier {
    fn verify(&self, layout: &StoreLayout, record_format: RecordFormat) -> Result<StoreMetadata> {
        let root = layout.root();
        let metadata = read_metadata(layout)?
            .ok_or_else(|| RestoreError::incompatible(root, "store metadata is missing"))?;

        if metadata.version != METADATA_VERSION {
            return Err(RestoreError::incompatible(
                root,
                format!(
                    "metadata version {} is not supported (expected {})",
                    metadata.version, METADATA_VERSION
                ),
            ));
        }

        if let Some(conversion) = &metadata.conversion {
            return Err(RestoreError::AlreadyConverted {
                path: root.to_path_buf(),
                seed: conversion.seed.to_string(),
            });
        }

        if metadata.record_format != record_format {
            return Err(RestoreError::incompatible(
                root,
                format!(
                    "store uses record format '{}', requested '{}'",
                    metadata.record_format, record_format
                ),
            ));
        }

        let snapshot = SnapshotManager::new(layout.snapshot_path())
            .load()?
            .ok_or_else(|| RestoreError::incompatible(root, "snapshot is missing"))?;

        if snapshot.version != record_format.snapshot_version() {
            return Err(RestoreError::incompatible(
                root,
                format!(
                    "snapshot version {} does not match record format '{}'",
                    snapshot.version, record_format
                ),
            ));
        }
        if snapshot.last_tx_id != metadata.last_tx_id {
            return Err(RestoreError::incompatible(
                root,
                format!(
                    "snapshot ends at transaction {} but metadata records {}",
                    snapshot.last_tx_id, metadata.last_tx_id
                ),
            ));
        }

        if wal_len(layout)? > 0 {
            return Err(RestoreError::incompatible(
                root,
                "write-ahead log holds entries that were never checkpointed",
            ));
        }

        Ok(metadata)
    }
}
