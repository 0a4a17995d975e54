use crate::core::error::{RestoreError, Result, io_err};
use crate::core::{ClusterSeed, TargetStore};
use crate::storage::metadata::{read_json, write_json_atomic};
use crate::storage::{StoreLayout, read_metadata};
use std::fs;
use tracing::info;
use uuid::Uuid;

pub trait SeedGenerator {
    /// Produces the cluster seed for a store restored earlier in the same run.
    fn generate(&self, target: &TargetStore) -> Result<ClusterSeed>;

    /// Drops anything `generate` left on disk for `target` after the seed
    /// failed to convert.
    fn discard(&self, _target: &TargetStore) -> Result<()> {
        Ok(())
    }
}

/// Draws the conversion id from the OS random source and binds it to the
/// restored store's identity.
///
/// The seed is staged to `cluster-seed.pending` inside the store before it is
/// returned. Only a run that dies before conversion leaves it on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSeedGenerator;

impl RandomSeedGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl SeedGenerator for RandomSeedGenerator {
    fn generate(&self, target: &TargetStore) -> Result<ClusterSeed> {
        let layout = StoreLayout::new(target.database_path());
        let metadata = read_metadata(&layout)
            .map_err(|err| RestoreError::SeedGeneration(err.to_string()))?
            .ok_or_else(|| {
                RestoreError::SeedGeneration(format!(
                    "no store metadata at '{}'",
                    layout.root().display()
                ))
            })?;

        let seed = ClusterSeed::new(Uuid::new_v4(), metadata.store_id, metadata.last_tx_id);
        write_json_atomic(&layout.pending_seed_path(), &seed)?;

        info!(
            database = target.database_name(),
            store_id = %seed.store_id(),
            "cluster seed generated"
        );
        Ok(seed)
    }

    fn discard(&self, target: &TargetStore) -> Result<()> {
        discard_staged_seed(&StoreLayout::new(target.database_path()))
    }
}

/// Reads the seed staged by a previous `generate` call, if any.
pub fn read_staged_seed(layout: &StoreLayout) -> Result<Option<ClusterSeed>> {
    read_json(&layout.pending_seed_path())
}

/// Removes the staged seed; a store without one is left as is.
pub fn discard_staged_seed(layout: &StoreLayout) -> Result<()> {
    let pending = layout.pending_seed_path();
    match fs::remove_file(&pending) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err("Failed to remove staged seed", &pending)(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RecordFormat;
    use crate::storage::create_classic_store;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_seed_is_bound_and_staged() {
        let home = TempDir::new().unwrap();
        let target = TargetStore::new(home.path(), "graph.db", RecordFormat::Standard).unwrap();
        let metadata =
            create_classic_store(target.database_path(), RecordFormat::Standard, 9, BTreeMap::new())
                .unwrap();

        let seed = RandomSeedGenerator::new().generate(&target).unwrap();
        assert_eq!(seed.store_id(), metadata.store_id);
        assert_eq!(seed.last_tx_id(), 9);

        let layout = StoreLayout::new(target.database_path());
        assert_eq!(read_staged_seed(&layout).unwrap(), Some(seed));
    }

    #[test]
    fn test_discard_removes_staged_seed() {
        let home = TempDir::new().unwrap();
        let target = TargetStore::new(home.path(), "graph.db", RecordFormat::Standard).unwrap();
        create_classic_store(target.database_path(), RecordFormat::Standard, 1, BTreeMap::new())
            .unwrap();

        let generator = RandomSeedGenerator::new();
        generator.generate(&target).unwrap();
        generator.discard(&target).unwrap();

        let layout = StoreLayout::new(target.database_path());
        assert_eq!(read_staged_seed(&layout).unwrap(), None);
        // Nothing staged is not an error.
        generator.discard(&target).unwrap();
    }

    #[test]
    fn test_missing_store_fails() {
        let home = TempDir::new().unwrap();
        let target = TargetStore::new(home.path(), "graph.db", RecordFormat::Standard).unwrap();
        let err = RandomSeedGenerator::new().generate(&target).unwrap_err();
        assert!(matches!(err, RestoreError::SeedGeneration(_)));
    }
}
