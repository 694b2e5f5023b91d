use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// File name of the manifest at the root of an extracted pack
pub const MANIFEST_FILE: &str = "pack.json";

fn default_db_path() -> String {
    "~/.simplifia/state.db".to_string()
}

/// Parsed `pack.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub install: InstallSpec,
}

/// The `install` section of a manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallSpec {
    /// Source category (a directory under the pack root) to destination
    /// template, in declared order
    #[serde(default)]
    pub copy_to: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<DbConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Only `"sqlite"` is migrated; a block without a type is skipped
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Database file template, `~` expands to the home directory
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Migration scripts relative to the pack root, applied in order
    #[serde(default)]
    pub migrations: Vec<String>,
}

impl DbConfig {
    pub fn is_sqlite(&self) -> bool {
        self.kind.as_deref() == Some("sqlite")
    }
}

impl Manifest {
    /// Read and parse a manifest file
    pub fn from_file(path: &Path) -> Result<Self, ExtractionError> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| ExtractionError::InvalidManifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Name to record, falling back to the pack id
    pub fn name_or<'a>(&'a self, pack_id: &'a str) -> &'a str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(pack_id)
    }

    /// Version to record, falling back to the registry's latest version
    pub fn version_or<'a>(&'a self, registry_version: &'a str) -> &'a str {
        self.version
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(registry_version)
    }

    pub fn has_db(&self) -> bool {
        self.install.db.is_some()
    }
}
