//! Record of installed packs, stored as `installed.json`.
//!
//! The ledger is advisory: it may under-count what is on disk but never
//! over-counts. A missing or unreadable document reads as empty, and every
//! write replaces the file atomically.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackRecord {
    pub name: String,
    pub version: String,
    /// RFC 3339 UTC timestamp
    pub installed_at: String,
    /// Store migrated for this pack, removed by a purging uninstall
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

impl InstalledPackRecord {
    /// A record stamped with the current time
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            installed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            db_path: None,
        }
    }

    pub fn with_db_path(mut self, db_path: Option<PathBuf>) -> Self {
        self.db_path = db_path;
        self
    }
}

pub type LedgerEntries = BTreeMap<String, InstalledPackRecord>;

pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_all(&self) -> LedgerEntries {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LedgerEntries::new(),
            Err(e) => {
                log::warn!("Cannot read {}: {}", self.path.display(), e);
                return LedgerEntries::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt ledger {}: {}", self.path.display(), e);
            LedgerEntries::new()
        })
    }

    pub fn get(&self, pack_id: &str) -> Option<InstalledPackRecord> {
        self.get_all().remove(pack_id)
    }

    pub fn put(&self, pack_id: &str, record: InstalledPackRecord) -> Result<(), LedgerError> {
        let mut entries = self.get_all();
        entries.insert(pack_id.to_string(), record);
        self.write(&entries)
    }

    /// Delete a record, returning it if it existed. Absent ids leave the file alone.
    pub fn remove(&self, pack_id: &str) -> Result<Option<InstalledPackRecord>, LedgerError> {
        let mut entries = self.get_all();
        let removed = entries.remove(pack_id);
        if removed.is_some() {
            self.write(&entries)?;
        }
        Ok(removed)
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write(&self, entries: &LedgerEntries) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(entries)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        temp.write_all(json.as_bytes()).map_err(|e| self.io_error(e))?;
        temp.write_all(b"\n").map_err(|e| self.io_error(e))?;
        temp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        temp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        log::debug!("Wrote {} ledger entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}
