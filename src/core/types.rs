use super::error::{RestoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Record Format
// ============================================================================

/// On-disk record layout of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFormat {
    #[default]
    Standard,
    HighLimit,
}

impl RecordFormat {
    pub fn name(&self) -> &'static str {
        match self {
            RecordFormat::Standard => "standard",
            RecordFormat::HighLimit => "high_limit",
        }
    }

    /// Snapshot version written by stores using this format.
    pub fn snapshot_version(&self) -> u32 {
        match self {
            RecordFormat::Standard => 1,
            RecordFormat::HighLimit => 2,
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecordFormat {
    type Err = RestoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(RecordFormat::Standard),
            "high_limit" => Ok(RecordFormat::HighLimit),
            _ => Err(RestoreError::UnsupportedRecordFormat(s.to_string())),
        }
    }
}

// ============================================================================
// Cluster Seed
// ============================================================================

/// Identity handed to every replica that joins a cluster founded from a restored store.
///
/// The conversion id is random; `store_id` and `last_tx_id` pin the seed to the
/// exact store image it was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSeed {
    conversion_id: Uuid,
    store_id: Uuid,
    last_tx_id: u64,
}

impl ClusterSeed {
    pub fn new(conversion_id: Uuid, store_id: Uuid, last_tx_id: u64) -> Self {
        Self {
            conversion_id,
            store_id,
            last_tx_id,
        }
    }

    pub fn conversion_id(&self) -> Uuid {
        self.conversion_id
    }

    pub fn store_id(&self) -> Uuid {
        self.store_id
    }

    pub fn last_tx_id(&self) -> u64 {
        self.last_tx_id
    }
}

impl fmt::Display for ClusterSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.conversion_id)
    }
}

// ============================================================================
// Backup Source / Target Store
// ============================================================================

/// A directory holding a previously captured classic store. Never written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSource {
    path: PathBuf,
}

impl BackupSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Location and identity of the database being bootstrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStore {
    home_dir: PathBuf,
    data_directory: PathBuf,
    database_name: String,
    record_format: RecordFormat,
}

impl TargetStore {
    pub const DEFAULT_DATA_DIRECTORY: &'static str = "data";

    pub fn new(
        home_dir: impl Into<PathBuf>,
        database_name: impl Into<String>,
        record_format: RecordFormat,
    ) -> Result<Self> {
        let database_name = database_name.into();
        validate_database_name(&database_name)?;
        Ok(Self {
            home_dir: home_dir.into(),
            data_directory: PathBuf::from(Self::DEFAULT_DATA_DIRECTORY),
            database_name,
            record_format,
        })
    }

    /// Overrides the data directory. Relative paths resolve against the home directory.
    pub fn with_data_directory(mut self, data_directory: impl Into<PathBuf>) -> Self {
        self.data_directory = data_directory.into();
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn record_format(&self) -> RecordFormat {
        self.record_format
    }

    /// `<home>/<data>/databases/<name>`
    pub fn database_path(&self) -> PathBuf {
        let data_dir = if self.data_directory.is_absolute() {
            self.data_directory.clone()
        } else {
            self.home_dir.join(&self.data_directory)
        };
        data_dir.join("databases").join(&self.database_name)
    }
}

fn validate_database_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RestoreError::Config(
            "database name must not be empty".to_string(),
        ));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(RestoreError::Config(format!(
            "database name '{}' must be a single path segment",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format_parse() {
        assert_eq!("standard".parse::<RecordFormat>().unwrap(), RecordFormat::Standard);
        assert_eq!(" HIGH_LIMIT ".parse::<RecordFormat>().unwrap(), RecordFormat::HighLimit);
        assert!(matches!(
            "columnar".parse::<RecordFormat>(),
            Err(RestoreError::UnsupportedRecordFormat(_))
        ));
    }

    #[test]
    fn test_database_path_layout() {
        let target = TargetStore::new("/opt/memodb", "graph.db", RecordFormat::Standard).unwrap();
        assert_eq!(
            target.database_path(),
            PathBuf::from("/opt/memodb/data/databases/graph.db")
        );

        let target = target.with_data_directory("/srv/memodb-data");
        assert_eq!(
            target.database_path(),
            PathBuf::from("/srv/memodb-data/databases/graph.db")
        );
    }

    #[test]
    fn test_database_name_validation() {
        for bad in ["", "  ", ".", "..", "a/b", "../escape", "a\\b"] {
            assert!(
                TargetStore::new("/home", bad, RecordFormat::Standard).is_err(),
                "name {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_seed_displays_conversion_id() {
        let id = Uuid::new_v4();
        let seed = ClusterSeed::new(id, Uuid::new_v4(), 42);
        assert_eq!(seed.to_string(), id.to_string());
    }
}
