use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpError;

/// Why a pack identifier could not be resolved against the registry.
///
/// All variants block installation; they only differ in the message shown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    #[error("not listed in the registry")]
    Unknown,

    #[error("registry unreachable: {0}")]
    Unreachable(String),

    #[error("registry document is malformed: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Timed out downloading {url}")]
    Timeout { url: String },

    #[error("HTTP {status} while downloading {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Network error downloading {url}: {message}")]
    Network { url: String, message: String },

    #[error("Download of {url} exceeds the {limit} byte limit")]
    TooLarge { url: String, limit: u64 },

    #[error("IO error while writing download: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Archive is corrupt: {0}")]
    Corrupt(String),

    #[error("pack.json not found in archive (searched {searched} and its subdirectories)")]
    ManifestMissing { searched: PathBuf },

    #[error("Path traversal detected in archive entry: {entry}")]
    PathTraversal { entry: String },

    #[error("Invalid pack.json at {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("IO error during extraction: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to write ledger {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A single migration script that failed. Never aborts the install.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Migration {script} failed: {message}")]
pub struct MigrationError {
    pub script: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum PackError {
    // Registry errors
    #[error("Pack '{pack_id}' not found: {reason}")]
    NotFound { pack_id: String, reason: LookupFailure },

    #[error("Registry unavailable: {0}")]
    Registry(LookupFailure),

    #[error("Pack '{pack_id}' has no release available yet")]
    NoRelease { pack_id: String },

    // Pipeline stage errors
    #[error("Download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("SHA-256 verification failed (expected {expected}, got {actual})")]
    DigestMismatch { expected: String, actual: String },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Failed to install '{category}': {source}")]
    Install {
        category: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid install layout for '{category}': {message}")]
    InvalidLayout { category: String, message: String },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    // Lifecycle errors
    #[error("Pack '{pack_id}' is not installed")]
    NotInstalled { pack_id: String },

    #[error("No entitlement for pack '{pack_id}'")]
    NotEntitled { pack_id: String },

    #[error("Activation required: no session token found")]
    Unauthenticated,

    #[error("Log store error: {0}")]
    LogStore(#[from] rusqlite::Error),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PackError>;
