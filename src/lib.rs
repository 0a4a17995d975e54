// ============================================================================
// RustMemDB Restore Library
// ============================================================================

pub mod bootstrap;
pub mod config;
pub mod convert;
pub mod core;
pub mod raft;
pub mod restore;
pub mod seed;
pub mod storage;

// Re-export main types for convenience
pub use bootstrap::{BootstrapOrchestrator, BootstrapStage, FailedStage};
pub use config::{BootstrapConfig, Settings};
pub use convert::{ClassicStoreConverter, ClassicStoreVerifier, ConversionVerifier, StoreConverter};
pub use crate::core::{BackupSource, ClusterSeed, RecordFormat, RestoreError, Result, TargetStore};
pub use restore::{BackupRestorer, FsBackupRestorer};
pub use seed::{RandomSeedGenerator, SeedGenerator};
