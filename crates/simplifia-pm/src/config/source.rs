use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PackError, Result};

/// Represents the source of a configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default built-in value
    Default,
    /// From `<root>/config.json`
    File,
    /// From environment variable
    Environment(String),
    /// Programmatically set
    Command,
}

impl ConfigSource {
    pub fn as_str(&self) -> &str {
        match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment(var) => var,
            ConfigSource::Command => "command",
        }
    }
}

/// Settings as they appear in `config.json`.
///
/// The setup wizard stores unrelated keys (`provider`, `api_key`) in the
/// same file; they are ignored here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_download_bytes: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cafile: Option<PathBuf>,
}

/// Loads configuration from the environment and the config file
#[derive(Debug)]
pub struct ConfigLoader {
    use_environment: bool,
}

impl ConfigLoader {
    pub fn new(use_environment: bool) -> Self {
        Self { use_environment }
    }

    /// Get a SIMPLIFIA_* environment variable, treating empty values as unset
    pub fn get_env(&self, var: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(var).ok().filter(|s| !s.is_empty())
    }

    /// Get the user's home directory
    pub fn get_home_dir(&self) -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the workspace root (`~/.simplifia` unless SIMPLIFIA_HOME is set)
    pub fn get_root_dir(&self) -> PathBuf {
        if let Some(root) = self.get_env("SIMPLIFIA_HOME") {
            return PathBuf::from(root);
        }

        self.get_home_dir().join(".simplifia")
    }

    /// Load configuration from a JSON file. A missing file yields defaults.
    pub fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<RawConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(RawConfig::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| PackError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| PackError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Get a configuration value from environment variable.
    /// Converts "registry-url" to "SIMPLIFIA_REGISTRY_URL"
    pub fn get_env_config(&self, key: &str) -> Option<String> {
        self.get_env(&Self::env_var_name(key))
    }

    /// Get unsigned integer value from environment variable
    pub fn get_env_u64(&self, key: &str) -> Option<u64> {
        self.get_env_config(key).and_then(|val| val.parse().ok())
    }

    /// Get a path value from environment variable
    pub fn get_env_path(&self, key: &str) -> Option<PathBuf> {
        self.get_env_config(key).map(PathBuf::from)
    }

    pub fn env_var_name(key: &str) -> String {
        format!("SIMPLIFIA_{}", key.replace('-', "_").to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_source_as_str() {
        assert_eq!(ConfigSource::Default.as_str(), "default");
        assert_eq!(ConfigSource::File.as_str(), "file");
        assert_eq!(ConfigSource::Command.as_str(), "command");
        assert_eq!(
            ConfigSource::Environment("SIMPLIFIA_HOME".to_string()).as_str(),
            "SIMPLIFIA_HOME"
        );
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(ConfigLoader::env_var_name("registry-url"), "SIMPLIFIA_REGISTRY_URL");
        assert_eq!(ConfigLoader::env_var_name("download-timeout"), "SIMPLIFIA_DOWNLOAD_TIMEOUT");
    }

    #[test]
    fn test_env_disabled_returns_none() {
        let loader = ConfigLoader::new(false);
        assert_eq!(loader.get_env("PATH"), None);
        assert_eq!(loader.get_env_config("registry-url"), None);
    }

    #[test]
    fn test_root_dir_defaults_under_home() {
        let loader = ConfigLoader::new(false);
        let root = loader.get_root_dir();
        assert!(root.ends_with(".simplifia"));
        assert!(root.starts_with(loader.get_home_dir()));
    }

    #[test]
    fn test_missing_config_file_is_default() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(false);
        let raw = loader.load_config_file(dir.path().join("config.json")).unwrap();
        assert!(raw.registry_url.is_none());
        assert!(raw.download_timeout.is_none());
    }

    #[test]
    fn test_config_file_ignores_wizard_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"provider": "openai", "api_key": "sk-test", "download_timeout": 90}"#,
        )
        .unwrap();

        let loader = ConfigLoader::new(false);
        let raw = loader.load_config_file(&path).unwrap();
        assert_eq!(raw.download_timeout, Some(90));
    }

    #[test]
    fn test_malformed_config_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let loader = ConfigLoader::new(false);
        assert!(matches!(loader.load_config_file(&path), Err(PackError::Config(_))));
    }
}
