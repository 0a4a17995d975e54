use crate::core::error::{Result, io_err};
use std::fs;
use std::path::{Path, PathBuf};

pub const METADATA_FILE: &str = "rustmemodb.meta";
pub const SNAPSHOT_FILE: &str = "rustmemodb.snapshot";
pub const WAL_FILE: &str = "rustmemodb.wal";
pub const PENDING_SEED_FILE: &str = "cluster-seed.pending";

/// File names inside a single store directory.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.root.join(WAL_FILE)
    }

    pub fn pending_seed_path(&self) -> PathBuf {
        self.root.join(PENDING_SEED_FILE)
    }

    /// True when something already occupies the store location.
    ///
    /// An empty directory is a free slot; a plain file in its place counts as data.
    pub fn has_store_data(&self) -> Result<bool> {
        let meta = match fs::symlink_metadata(&self.root) {
            Ok(meta) => meta,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(io_err("Failed to inspect target", &self.root)(err)),
        };
        if !meta.is_dir() {
            return Ok(true);
        }

        let mut entries =
            fs::read_dir(&self.root).map_err(io_err("Failed to list target", &self.root))?;
        Ok(entries.next().is_some())
    }
}
