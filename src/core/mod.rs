pub mod error;
pub mod types;

pub use error::{RestoreError, Result};
pub use types::{BackupSource, ClusterSeed, RecordFormat, TargetStore};
