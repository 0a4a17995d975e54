//! Materializes a backup directory at the target database location.

use crate::core::error::{RestoreError, Result, io_err};
use crate::core::{BackupSource, TargetStore};
use crate::storage::StoreLayout;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub trait BackupRestorer {
    /// Replaces (or creates) the target store with a copy of `source`.
    ///
    /// Fails with `TargetExists` before touching anything when the target holds
    /// data and `force` is false.
    fn restore(&self, source: &BackupSource, target: &TargetStore, force: bool) -> Result<()>;
}

/// Copies the backup into a sibling staging directory, then renames it into place.
///
/// The target is only removed once the full copy exists on disk, so a failed
/// copy never leaves a half-populated store at the target path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBackupRestorer;

impl FsBackupRestorer {
    pub fn new() -> Self {
        Self
    }
}

impl BackupRestorer for FsBackupRestorer {
    fn restore(&self, source: &BackupSource, target: &TargetStore, force: bool) -> Result<()> {
        let source_dir = source.path();
        if !source_dir.is_dir() {
            return Err(RestoreError::SourceNotFound(source_dir.to_path_buf()));
        }

        let database_path = target.database_path();
        ensure_disjoint(source_dir, &database_path)?;

        let layout = StoreLayout::new(&database_path);
        let occupied = layout.has_store_data()?;
        if occupied && !force {
            return Err(RestoreError::TargetExists(database_path));
        }

        let parent = database_path.parent().ok_or_else(|| {
            RestoreError::Config(format!(
                "database path '{}' has no parent directory",
                database_path.display()
            ))
        })?;
        fs::create_dir_all(parent).map_err(io_err("Failed to create databases directory", parent))?;

        let staging = tempfile::Builder::new()
            .prefix(".restore-")
            .tempdir_in(parent)
            .map_err(io_err("Failed to create staging directory in", parent))?;
        debug!(staging = %staging.path().display(), "copying backup into staging directory");
        copy_dir_recursive(source_dir, staging.path())?;

        if occupied {
            warn!(database = %database_path.display(), "force overwrite: removing existing store");
        }
        remove_existing(&database_path)?;

        fs::rename(staging.path(), &database_path)
            .map_err(io_err("Failed to move restored store into", &database_path))?;

        info!(
            source = %source_dir.display(),
            database = %database_path.display(),
            "backup restored"
        );
        Ok(())
    }
}

/// Rejects a source and target that are the same directory or nested in each other.
fn ensure_disjoint(source: &Path, target: &Path) -> Result<()> {
    let source = fs::canonicalize(source).map_err(io_err("Failed to resolve backup source", source))?;
    let target = resolve_lenient(target)?;

    if source.starts_with(&target) || target.starts_with(&source) {
        return Err(RestoreError::Config(format!(
            "backup source '{}' and target '{}' overlap",
            source.display(),
            target.display()
        )));
    }
    Ok(())
}

/// Canonicalizes the longest existing prefix of `path` and appends the rest.
fn resolve_lenient(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(io_err("Failed to resolve current directory for", path))?
            .join(path)
    };

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(resolved) => {
                return Ok(tail.iter().rev().fold(resolved, |acc, part| acc.join(part)));
            }
            Err(_) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    tail.push(name.to_os_string());
                    existing = parent;
                }
                _ => return Ok(absolute),
            },
        }
    }
}

fn remove_existing(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(io_err("Failed to inspect target", path)(err)),
    };

    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(io_err("Failed to remove existing store", path))
    } else {
        fs::remove_file(path).map_err(io_err("Failed to remove existing file", path))
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(io_err("Failed to create directory", to))?;

    for entry in fs::read_dir(from).map_err(io_err("Failed to list backup directory", from))? {
        let entry = entry.map_err(io_err("Failed to read backup entry in", from))?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(io_err("Failed to inspect backup entry", &src))?;

        if file_type.is_dir() {
            copy_dir_recursive(&src, &dst)?;
        } else if file_type.is_file() {
            fs::copy(&src, &dst).map_err(io_err("Failed to copy backup file", &src))?;
        } else {
            return Err(RestoreError::Io(format!(
                "Unsupported entry in backup '{}': only regular files and directories are restored",
                src.display()
            )));
        }
    }
    Ok(())
}
