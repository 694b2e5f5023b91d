use std::fmt;
use std::path::PathBuf;

use crate::downloader::Verification;
use crate::installer::{CopyStep, MigrationReport};
use crate::ledger::InstalledPackRecord;

/// Pipeline position of an install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    Resolving,
    Downloading,
    Verifying,
    Extracting,
    Installing,
    Migrating,
    Committing,
    Done,
}

impl InstallStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallStage::Resolving => "resolving",
            InstallStage::Downloading => "downloading",
            InstallStage::Verifying => "verifying",
            InstallStage::Extracting => "extracting",
            InstallStage::Installing => "installing",
            InstallStage::Migrating => "migrating",
            InstallStage::Committing => "committing",
            InstallStage::Done => "done",
        }
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reported to install observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallEvent {
    Stage(InstallStage),
    /// Bytes downloaded so far and the announced total (0 when unknown)
    Progress { downloaded: u64, total: u64 },
}

#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub pack_id: String,
    pub record: InstalledPackRecord,
    pub force: bool,
    pub bytes_downloaded: u64,
    pub verification: Verification,
    pub copied: Vec<CopyStep>,
    pub migrations: Option<MigrationReport>,
    /// First-run report, `None` when it could not be written
    pub report: Option<PathBuf>,
}

impl InstallOutcome {
    pub fn migration_warnings(&self) -> usize {
        self.migrations
            .as_ref()
            .map(|report| report.failures().count())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// Ledger already records the registry's latest version; nothing downloaded
    UpToDate { pack_id: String, version: String },
    Updated { from: String, outcome: InstallOutcome },
}

impl UpdateOutcome {
    pub fn pack_id(&self) -> &str {
        match self {
            UpdateOutcome::UpToDate { pack_id, .. } => pack_id,
            UpdateOutcome::Updated { outcome, .. } => &outcome.pack_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    Absent,
    Failed(String),
}

/// One pack folder considered during uninstall
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalStep {
    pub path: PathBuf,
    pub outcome: RemovalOutcome,
}

/// What happened to the pack's migrated store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataDisposition {
    /// The pack never recorded a store
    NoData,
    Kept(PathBuf),
    Purged(PathBuf),
    PurgeFailed { path: PathBuf, message: String },
    /// Purge was requested but the store is not this pack's alone to delete
    Retained { path: PathBuf, reason: String },
}

#[derive(Debug, Clone)]
pub struct UninstallOutcome {
    pub pack_id: String,
    pub record: InstalledPackRecord,
    pub folders: Vec<RemovalStep>,
    pub data: DataDisposition,
}

impl UninstallOutcome {
    pub fn failed_removals(&self) -> impl Iterator<Item = &RemovalStep> {
        self.folders
            .iter()
            .filter(|step| matches!(step.outcome, RemovalOutcome::Failed(_)))
    }
}
