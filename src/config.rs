use crate::core::error::{RestoreError, Result, io_err};
use crate::core::{BackupSource, RecordFormat, TargetStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "rustmemodb.conf";

const DATA_DIRECTORY_KEY: &str = "dbms.directories.data";
const RECORD_FORMAT_KEY: &str = "dbms.record_format";

/// Settings read from `rustmemodb.conf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_directory: PathBuf,
    pub record_format: RecordFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from(TargetStore::DEFAULT_DATA_DIRECTORY),
            record_format: RecordFormat::default(),
        }
    }
}

impl Settings {
    /// Parses `key=value` lines. `#` starts a comment line; unknown keys are ignored.
    pub fn parse(input: &str) -> Result<Self> {
        let mut settings = Settings::default();

        for (line_no, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                RestoreError::Config(format!(
                    "line {}: expected 'key=value', found '{}'",
                    line_no + 1,
                    line
                ))
            })?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                DATA_DIRECTORY_KEY => {
                    if value.is_empty() {
                        return Err(RestoreError::Config(format!(
                            "line {}: {} must not be empty",
                            line_no + 1,
                            DATA_DIRECTORY_KEY
                        )));
                    }
                    settings.data_directory = PathBuf::from(value);
                }
                RECORD_FORMAT_KEY => settings.record_format = value.parse()?,
                _ => debug!(key, "ignoring unrecognised setting"),
            }
        }

        Ok(settings)
    }

    /// Loads `<config_dir>/rustmemodb.conf`, falling back to defaults when absent.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Settings::default())
            }
            Err(err) => Err(io_err("Failed to read config file", &path)(err)),
        }
    }
}

/// Everything one bootstrap run consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub home_dir: PathBuf,
    pub database_name: String,
    pub config_dir: PathBuf,
    pub from: PathBuf,
    pub force: bool,
    pub record_format: RecordFormat,
    pub data_directory: PathBuf,
}

impl BootstrapConfig {
    /// Combines command-line options with the settings file in `config_dir`.
    pub fn load(
        home_dir: impl Into<PathBuf>,
        database_name: impl Into<String>,
        config_dir: impl Into<PathBuf>,
        from: impl Into<PathBuf>,
        force: bool,
    ) -> Result<Self> {
        let config_dir = config_dir.into();
        let settings = Settings::load(&config_dir)?;
        Ok(Self {
            home_dir: home_dir.into(),
            database_name: database_name.into(),
            config_dir,
            from: from.into(),
            force,
            record_format: settings.record_format,
            data_directory: settings.data_directory,
        })
    }

    pub fn source(&self) -> BackupSource {
        BackupSource::new(&self.from)
    }

    pub fn target(&self) -> Result<TargetStore> {
        Ok(
            TargetStore::new(&self.home_dir, &self.database_name, self.record_format)?
                .with_data_directory(&self.data_directory),
        )
    }
}
