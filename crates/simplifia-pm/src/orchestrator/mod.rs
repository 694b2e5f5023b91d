//! The install pipeline and the pack lifecycle built on top of it.
//!
//! An install walks resolve, download, verify, extract, install, migrate
//! and commit in that order. Any failure before the layout installer runs
//! leaves the workspace untouched; the ledger is written last, so a pack
//! is never recorded without its files.

mod outcome;
mod staging;

use std::path::{Path, PathBuf};

pub use outcome::{
    DataDisposition, InstallEvent, InstallOutcome, InstallStage, RemovalOutcome, RemovalStep,
    UninstallOutcome, UpdateOutcome,
};
pub use staging::StagingArea;

use crate::config::Settings;
use crate::downloader::{verify_digest, ArchiveExtractor, ArtifactFetcher, HttpFetcher, ZipExtractor};
use crate::http::{HttpClient, HttpError};
use crate::installer::{LayoutInstaller, MigrationRunner};
use crate::ledger::{InstalledPackRecord, Ledger};
use crate::registry::{PackDescriptor, PackRegistry, RegistryClient};
use crate::report::write_first_run_report;
use crate::util::{is_within, normalize_path};
use crate::{PackError, Result};

/// Folders under the workspace root that hold per-pack content
pub const PACK_FOLDERS: [&str; 3] = ["workflows", "rules", "assets"];

/// Installs, updates and removes packs.
pub struct PackManager {
    settings: Settings,
    registry: Box<dyn PackRegistry>,
    fetcher: Box<dyn ArtifactFetcher>,
    extractor: Box<dyn ArchiveExtractor>,
    ledger: Ledger,
    layout: LayoutInstaller,
    migrations: MigrationRunner,
}

impl PackManager {
    pub fn builder(settings: Settings) -> PackManagerBuilder {
        PackManagerBuilder::new(settings)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Every pack the registry lists
    pub fn available(&mut self, force_refresh: bool) -> Result<Vec<PackDescriptor>> {
        self.registry.packs(force_refresh)
    }

    pub fn install(&mut self, pack_id: &str, force: bool) -> Result<InstallOutcome> {
        self.install_with(pack_id, force, &|_| {})
    }

    /// Run the install pipeline, reporting stages and download progress
    pub fn install_with(
        &mut self,
        pack_id: &str,
        force: bool,
        observer: &dyn Fn(InstallEvent),
    ) -> Result<InstallOutcome> {
        let staging = StagingArea::create(self.settings.staging_dir.as_deref())?;
        let outcome = self.run_pipeline(&staging, pack_id, force, observer);

        if let Err(e) = &outcome {
            log::debug!("Install of {} failed: {}", pack_id, e);
        }
        outcome
    }

    fn run_pipeline(
        &mut self,
        staging: &StagingArea,
        pack_id: &str,
        force: bool,
        observer: &dyn Fn(InstallEvent),
    ) -> Result<InstallOutcome> {
        let stage = |stage: InstallStage| {
            log::debug!("{}: {}", pack_id, stage);
            observer(InstallEvent::Stage(stage));
        };

        stage(InstallStage::Resolving);
        let descriptor = self.registry.resolve(pack_id)?;
        let url = descriptor
            .download_url
            .clone()
            .ok_or_else(|| PackError::NoRelease {
                pack_id: pack_id.to_string(),
            })?;
        if force {
            log::info!("Reinstalling {} (force)", pack_id);
        }

        stage(InstallStage::Downloading);
        let archive = staging.archive_path(pack_id);
        let bytes_downloaded = self.fetcher.download(
            &url,
            &archive,
            self.settings.download_timeout,
            &|downloaded, total| observer(InstallEvent::Progress { downloaded, total }),
        )?;

        stage(InstallStage::Verifying);
        let verification = verify_digest(&archive, descriptor.expected_digest.as_deref())?;

        stage(InstallStage::Extracting);
        let extracted = self.extractor.extract(&archive, &staging.extract_dir())?;
        let manifest = &extracted.manifest;

        stage(InstallStage::Installing);
        let copied = self.layout.install(&extracted.root, &manifest.install)?;

        let migrations = match &manifest.install.db {
            Some(db) => {
                stage(InstallStage::Migrating);
                Some(self.migrations.migrate(&extracted.root, db))
            }
            None => None,
        };

        stage(InstallStage::Committing);
        let db_path = migrations.as_ref().and_then(|report| report.database.clone());
        let record = InstalledPackRecord::new(
            manifest.name_or(pack_id),
            manifest.version_or(&descriptor.latest_version),
        )
        .with_db_path(db_path);
        self.ledger.put(pack_id, record.clone())?;

        let report = match write_first_run_report(&self.settings.root_dir, pack_id, &record, &copied) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Could not write the first-run report: {}", e);
                None
            }
        };

        log::info!("Installed {} {}", pack_id, record.version);
        stage(InstallStage::Done);

        Ok(InstallOutcome {
            pack_id: pack_id.to_string(),
            record,
            force,
            bytes_downloaded,
            verification,
            copied,
            migrations,
            report,
        })
    }

    pub fn update(&mut self, pack_id: &str) -> Result<UpdateOutcome> {
        self.update_with(pack_id, &|_| {})
    }

    /// Reinstall when the registry lists a different version than the ledger
    pub fn update_with(&mut self, pack_id: &str, observer: &dyn Fn(InstallEvent)) -> Result<UpdateOutcome> {
        let current = self.ledger.get(pack_id).ok_or_else(|| PackError::NotInstalled {
            pack_id: pack_id.to_string(),
        })?;

        let latest = self.registry.resolve(pack_id)?;
        if current.version == latest.latest_version {
            log::info!("{} is up to date ({})", pack_id, current.version);
            return Ok(UpdateOutcome::UpToDate {
                pack_id: pack_id.to_string(),
                version: current.version,
            });
        }

        log::info!("Updating {}: {} -> {}", pack_id, current.version, latest.latest_version);
        let outcome = self.install_with(pack_id, true, observer)?;
        Ok(UpdateOutcome::Updated {
            from: current.version,
            outcome,
        })
    }

    /// Update every ledger entry in id order; one failure does not stop the rest
    pub fn update_all(&mut self, observer: &dyn Fn(&str, InstallEvent)) -> Vec<(String, Result<UpdateOutcome>)> {
        let pack_ids: Vec<String> = self.ledger.get_all().into_keys().collect();

        pack_ids
            .into_iter()
            .map(|pack_id| {
                let result = self.update_with(&pack_id, &|event| observer(&pack_id, event));
                (pack_id, result)
            })
            .collect()
    }

    /// Remove a pack's folders and ledger record.
    ///
    /// Folder removal is best-effort; failures are collected, not raised.
    /// The migrated store is only deleted when `purge_data` is set.
    pub fn uninstall(&mut self, pack_id: &str, purge_data: bool) -> Result<UninstallOutcome> {
        let record = self.ledger.get(pack_id).ok_or_else(|| PackError::NotInstalled {
            pack_id: pack_id.to_string(),
        })?;

        let folders = PACK_FOLDERS
            .iter()
            .map(|category| self.remove_folder(category, pack_id))
            .collect();

        self.ledger.remove(pack_id)?;

        let data = match &record.db_path {
            None => DataDisposition::NoData,
            Some(path) if !purge_data => DataDisposition::Kept(path.clone()),
            Some(path) => match self.purge_blocker(path) {
                Some(reason) => {
                    log::warn!("Not deleting {}: {}", path.display(), reason);
                    DataDisposition::Retained {
                        path: path.clone(),
                        reason,
                    }
                }
                None => Self::purge_store(path),
            },
        };

        Ok(UninstallOutcome {
            pack_id: pack_id.to_string(),
            record,
            folders,
            data,
        })
    }

    /// `<root>/<category>/<pack_id>`, or `None` when the id is not a plain name
    pub fn pack_folder(&self, category: &str, pack_id: &str) -> Option<PathBuf> {
        let mut components = Path::new(pack_id).components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => {
                Some(self.settings.root_dir.join(category).join(pack_id))
            }
            _ => None,
        }
    }

    fn remove_folder(&self, category: &str, pack_id: &str) -> RemovalStep {
        let Some(path) = self.pack_folder(category, pack_id) else {
            return RemovalStep {
                path: self.settings.root_dir.join(category),
                outcome: RemovalOutcome::Failed(format!("'{}' is not a plain pack id", pack_id)),
            };
        };

        let outcome = if !path.exists() {
            RemovalOutcome::Absent
        } else {
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match removed {
                Ok(()) => {
                    log::info!("Removed {}", path.display());
                    RemovalOutcome::Removed
                }
                Err(e) => {
                    log::warn!("Could not remove {}: {}", path.display(), e);
                    RemovalOutcome::Failed(e.to_string())
                }
            }
        };

        RemovalStep { path, outcome }
    }

    /// Why a store must survive a purge: it lies outside the workspace,
    /// is the shared interaction log, or another installed pack uses it.
    /// Runs after the uninstalled pack has left the ledger.
    fn purge_blocker(&self, path: &Path) -> Option<String> {
        let settings = &self.settings;
        if !is_within(path, &settings.home_dir) && !is_within(path, &settings.root_dir) {
            return Some("it is outside the workspace".to_string());
        }

        let store = normalize_path(path);
        if store == normalize_path(&settings.log_db_path()) {
            return Some("it is the shared interaction log".to_string());
        }

        let users: Vec<String> = self
            .ledger
            .get_all()
            .into_iter()
            .filter(|(_, record)| {
                record
                    .db_path
                    .as_deref()
                    .is_some_and(|other| normalize_path(other) == store)
            })
            .map(|(pack_id, _)| pack_id)
            .collect();
        if users.is_empty() {
            None
        } else {
            Some(format!("it is also used by {}", users.join(", ")))
        }
    }

    fn purge_store(path: &Path) -> DataDisposition {
        match std::fs::remove_file(path) {
            Ok(()) => DataDisposition::Purged(path.to_path_buf()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => DataDisposition::Purged(path.to_path_buf()),
            Err(e) => {
                log::warn!("Could not remove {}: {}", path.display(), e);
                DataDisposition::PurgeFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Assembles a [`PackManager`], defaulting every seam to the real implementation
pub struct PackManagerBuilder {
    settings: Settings,
    registry: Option<Box<dyn PackRegistry>>,
    fetcher: Option<Box<dyn ArtifactFetcher>>,
    extractor: Option<Box<dyn ArchiveExtractor>>,
    bearer: Option<String>,
}

impl PackManagerBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            registry: None,
            fetcher: None,
            extractor: None,
            bearer: None,
        }
    }

    pub fn with_registry(mut self, registry: Box<dyn PackRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn ArtifactFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ArchiveExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Session token sent to the registry
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    pub fn build(self) -> Result<PackManager> {
        let settings = self.settings;

        let registry: Box<dyn PackRegistry> = match self.registry {
            Some(registry) => registry,
            None => {
                let http = HttpClient::with_config(settings.http_config()).map_err(HttpError::from)?;
                Box::new(RegistryClient::new(http, settings.registry_url.clone()).with_bearer(self.bearer))
            }
        };

        let fetcher: Box<dyn ArtifactFetcher> = self.fetcher.unwrap_or_else(|| {
            Box::new(HttpFetcher::new(settings.http_config()).with_max_bytes(settings.max_download_bytes))
        });

        let extractor = self.extractor.unwrap_or_else(|| Box::new(ZipExtractor::new()));

        Ok(PackManager {
            ledger: Ledger::new(settings.ledger_path()),
            layout: LayoutInstaller::new(&settings.home_dir, &settings.root_dir),
            migrations: MigrationRunner::new(&settings.home_dir, &settings.root_dir),
            registry,
            fetcher,
            extractor,
            settings,
        })
    }
}
