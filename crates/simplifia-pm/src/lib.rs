pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod installer;
pub mod ledger;
pub mod logs;
pub mod orchestrator;
pub mod pack;
pub mod registry;
pub mod report;
pub mod util;

pub use error::{
    ExtractionError, FetchError, LedgerError, LookupFailure, MigrationError, PackError, Result,
};
pub use config::{AuthState, Settings};
pub use downloader::{ArchiveExtractor, ArtifactFetcher, ExtractedPack, HttpFetcher, Verification, ZipExtractor};
pub use installer::{CopyOutcome, CopyStep, LayoutInstaller, MigrationOutcome, MigrationReport, MigrationRunner};
pub use ledger::{InstalledPackRecord, Ledger};
pub use logs::{Interaction, LogQuery, LogStore};
pub use orchestrator::{
    DataDisposition, InstallEvent, InstallOutcome, InstallStage, PackManager, PackManagerBuilder,
    RemovalOutcome, UninstallOutcome, UpdateOutcome,
};
pub use pack::Manifest;
pub use registry::{PackDescriptor, PackRegistry, RegistryClient};
