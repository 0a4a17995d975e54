use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Backup source '{0}' does not exist or is not a directory")]
    SourceNotFound(PathBuf),

    #[error("Target database '{0}' already exists (use --force to overwrite)")]
    TargetExists(PathBuf),

    #[error("Store at '{path}' is not a compatible classic store: {reason}")]
    IncompatibleStore { path: PathBuf, reason: String },

    #[error("Store at '{path}' was already converted with cluster seed {seed}")]
    AlreadyConverted { path: PathBuf, seed: String },

    #[error("Staged cluster seed {staged} does not match supplied seed {supplied}")]
    SeedMismatch { staged: String, supplied: String },

    #[error("Seed generation failed: {0}")]
    SeedGeneration(String),

    #[error("Unsupported record format: '{0}'")]
    UnsupportedRecordFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, RestoreError>;

impl RestoreError {
    pub(crate) fn incompatible(path: &Path, reason: impl Into<String>) -> Self {
        Self::IncompatibleStore {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Builds a `map_err` adapter that records what was being done and where.
pub(crate) fn io_err(
    action: &'static str,
    path: &Path,
) -> impl FnOnce(std::io::Error) -> RestoreError + use<> {
    let path = path.to_path_buf();
    move |err| RestoreError::Io(format!("{} '{}': {}", action, path.display(), err))
}
