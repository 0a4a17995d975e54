//! Turns a verified classic store into the founding replica of a cluster.

mod verifier;

pub use verifier::{ClassicStoreVerifier, ConversionVerifier};

use crate::core::error::{RestoreError, Result};
use crate::core::{ClusterSeed, RecordFormat, TargetStore};
use crate::seed::{discard_staged_seed, read_staged_seed};
use crate::storage::{ConversionRecord, StoreLayout, write_metadata};
use chrono::Utc;
use tracing::info;

pub trait StoreConverter {
    fn convert(&self, target: &TargetStore, record_format: RecordFormat, seed: &ClusterSeed) -> Result<()>;
}

/// Stamps the record format and the conversion record into store metadata.
///
/// Verification runs first and touches nothing; the metadata rewrite is a
/// single atomic file replacement.
#[derive(Debug, Clone, Default)]
pub struct ClassicStoreConverter<V = ClassicStoreVerifier> {
    verifier: V,
}

impl ClassicStoreConverter {
    pub fn new() -> Self {
        Self::with_verifier(ClassicStoreVerifier::new())
    }
}

impl<V: ConversionVerifier> ClassicStoreConverter<V> {
    pub fn with_verifier(verifier: V) -> Self {
        Self { verifier }
    }
}

impl<V: ConversionVerifier> StoreConverter for ClassicStoreConverter<V> {
    fn convert(&self, target: &TargetStore, record_format: RecordFormat, seed: &ClusterSeed) -> Result<()> {
        let layout = StoreLayout::new(target.database_path());
        let mut metadata = self.verifier.verify(&layout, record_format)?;

        if seed.store_id() != metadata.store_id || seed.last_tx_id() != metadata.last_tx_id {
            return Err(RestoreError::incompatible(
                layout.root(),
                format!(
                    "cluster seed {} was generated for store {}@{}, not {}@{}",
                    seed,
                    seed.store_id(),
                    seed.last_tx_id(),
                    metadata.store_id,
                    metadata.last_tx_id
                ),
            ));
        }

        if let Some(staged) = read_staged_seed(&layout)? {
            if staged.conversion_id() != seed.conversion_id() {
                return Err(RestoreError::SeedMismatch {
                    staged: staged.to_string(),
                    supplied: seed.to_string(),
                });
            }
        }

        metadata.record_format = record_format;
        metadata.conversion = Some(ConversionRecord {
            record_format,
            seed: seed.clone(),
            converted_at: Utc::now(),
        });
        write_metadata(&layout, &metadata)?;

        discard_staged_seed(&layout)?;

        info!(
            database = target.database_name(),
            record_format = %record_format,
            seed = %seed,
            "store converted"
        );
        Ok(())
    }
}
