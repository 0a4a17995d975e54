//! Restore, seed and convert, in that order, exactly once each.

use crate::config::BootstrapConfig;
use crate::convert::{ClassicStoreConverter, StoreConverter};
use crate::core::{BackupSource, ClusterSeed, Result, TargetStore};
use crate::restore::{BackupRestorer, FsBackupRestorer};
use crate::seed::{RandomSeedGenerator, SeedGenerator};
use std::fmt;
use tracing::{error, info, info_span, warn};

/// Progress of a single bootstrap run.
///
/// `Failed` records the stage that was running when the error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    Idle,
    Restoring,
    SeedingIdentity,
    Converting,
    Done,
    Failed(FailedStage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    Restoring,
    SeedingIdentity,
    Converting,
}

impl fmt::Display for FailedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailedStage::Restoring => write!(f, "restoring"),
            FailedStage::SeedingIdentity => write!(f, "seeding identity"),
            FailedStage::Converting => write!(f, "converting"),
        }
    }
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapStage::Idle => write!(f, "idle"),
            BootstrapStage::Restoring => write!(f, "restoring"),
            BootstrapStage::SeedingIdentity => write!(f, "seeding identity"),
            BootstrapStage::Converting => write!(f, "converting"),
            BootstrapStage::Done => write!(f, "done"),
            BootstrapStage::Failed(stage) => write!(f, "failed while {}", stage),
        }
    }
}

/// Forward-only pipeline: a failed stage is never retried and completed
/// stages are never rolled back. Recovery is a forced re-run.
pub struct BootstrapOrchestrator<R = FsBackupRestorer, S = RandomSeedGenerator, C = ClassicStoreConverter> {
    restorer: R,
    seeds: S,
    converter: C,
    stage: BootstrapStage,
}

impl BootstrapOrchestrator {
    pub fn new() -> Self {
        Self::with_components(
            FsBackupRestorer::new(),
            RandomSeedGenerator::new(),
            ClassicStoreConverter::new(),
        )
    }
}

impl Default for BootstrapOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, S, C> BootstrapOrchestrator<R, S, C>
where
    R: BackupRestorer,
    S: SeedGenerator,
    C: StoreConverter,
{
    pub fn with_components(restorer: R, seeds: S, converter: C) -> Self {
        Self {
            restorer,
            seeds,
            converter,
            stage: BootstrapStage::Idle,
        }
    }

    pub fn stage(&self) -> BootstrapStage {
        self.stage
    }

    /// Runs the pipeline for a loaded configuration.
    pub fn run(&mut self, config: &BootstrapConfig) -> Result<ClusterSeed> {
        let target = config.target()?;
        self.bootstrap(&config.source(), &target, config.force)
    }

    /// Restores `source` into `target`, generates one seed and converts the
    /// store with it, using the target's record format.
    pub fn bootstrap(
        &mut self,
        source: &BackupSource,
        target: &TargetStore,
        force: bool,
    ) -> Result<ClusterSeed> {
        let span = info_span!(
            "bootstrap",
            database = target.database_name(),
            record_format = %target.record_format(),
            force
        );
        let _enter = span.enter();
        self.stage = BootstrapStage::Idle;

        self.enter(BootstrapStage::Restoring);
        self.restorer
            .restore(source, target, force)
            .inspect_err(|err| self.fail(FailedStage::Restoring, err))?;

        self.enter(BootstrapStage::SeedingIdentity);
        let seed = self
            .seeds
            .generate(target)
            .inspect_err(|err| self.fail(FailedStage::SeedingIdentity, err))?;

        self.enter(BootstrapStage::Converting);
        self.converter
            .convert(target, target.record_format(), &seed)
            .inspect_err(|err| {
                self.fail(FailedStage::Converting, err);
                if let Err(discard_err) = self.seeds.discard(target) {
                    warn!(error = %discard_err, "failed to discard unconverted cluster seed");
                }
            })?;

        self.enter(BootstrapStage::Done);
        Ok(seed)
    }

    fn enter(&mut self, stage: BootstrapStage) {
        info!(stage = %stage, "bootstrap stage");
        self.stage = stage;
    }

    fn fail(&mut self, stage: FailedStage, err: &crate::core::RestoreError) {
        self.stage = BootstrapStage::Failed(stage);
        error!(stage = %stage, error = %err, "bootstrap failed");
    }
}
