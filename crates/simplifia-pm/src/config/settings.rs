use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::source::{ConfigLoader, ConfigSource, RawConfig};
use crate::error::Result;
use crate::http::HttpClientConfig;

pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/pala7777/simplifia-packs/main/manifest.json";
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 512 * 1024 * 1024;

/// Resolved configuration for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// User home directory, the target of `~` in path templates
    pub home_dir: PathBuf,
    /// Workspace root holding the ledger, auth file and log store
    pub root_dir: PathBuf,
    pub registry_url: String,
    pub registry_timeout: Duration,
    pub download_timeout: Duration,
    pub connect_timeout: Duration,
    /// Parent directory for staging areas; the system temp dir when unset
    pub staging_dir: Option<PathBuf>,
    pub max_download_bytes: Option<u64>,
    pub proxy: Option<String>,
    pub cafile: Option<PathBuf>,

    sources: BTreeMap<&'static str, ConfigSource>,
}

impl Settings {
    /// Defaults anchored at explicit home and root directories
    pub fn with_dirs<H: Into<PathBuf>, R: Into<PathBuf>>(home_dir: H, root_dir: R) -> Self {
        Self {
            home_dir: home_dir.into(),
            root_dir: root_dir.into(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            registry_timeout: DEFAULT_REGISTRY_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            staging_dir: None,
            max_download_bytes: Some(DEFAULT_MAX_DOWNLOAD_BYTES),
            proxy: None,
            cafile: None,
            sources: BTreeMap::new(),
        }
    }

    /// Build settings from defaults, `<root>/config.json` and `SIMPLIFIA_*` variables
    pub fn build(use_environment: bool) -> Result<Self> {
        let loader = ConfigLoader::new(use_environment);
        let mut settings = Self::with_dirs(loader.get_home_dir(), loader.get_root_dir());

        if loader.get_env("SIMPLIFIA_HOME").is_some() {
            settings.sources.insert("root", ConfigSource::Environment("SIMPLIFIA_HOME".to_string()));
        }

        let raw = loader.load_config_file(settings.config_path())?;
        settings.merge_raw_config(raw);
        settings.apply_env_overrides(&loader);

        log::debug!("Workspace root: {}", settings.root_dir.display());
        log::debug!("Registry: {}", settings.registry_url);

        Ok(settings)
    }

    fn merge_raw_config(&mut self, raw: RawConfig) {
        if let Some(url) = raw.registry_url {
            self.registry_url = url;
            self.sources.insert("registry-url", ConfigSource::File);
        }
        if let Some(secs) = raw.registry_timeout {
            self.registry_timeout = Duration::from_secs(secs);
            self.sources.insert("registry-timeout", ConfigSource::File);
        }
        if let Some(secs) = raw.download_timeout {
            self.download_timeout = Duration::from_secs(secs);
            self.sources.insert("download-timeout", ConfigSource::File);
        }
        if let Some(dir) = raw.staging_dir {
            self.staging_dir = Some(dir);
            self.sources.insert("staging-dir", ConfigSource::File);
        }
        if let Some(limit) = raw.max_download_bytes {
            self.max_download_bytes = Self::limit_or_unbounded(limit);
            self.sources.insert("max-download-bytes", ConfigSource::File);
        }
        if let Some(proxy) = raw.proxy {
            self.proxy = Some(proxy);
            self.sources.insert("proxy", ConfigSource::File);
        }
        if let Some(cafile) = raw.cafile {
            self.cafile = Some(cafile);
            self.sources.insert("cafile", ConfigSource::File);
        }
    }

    fn apply_env_overrides(&mut self, loader: &ConfigLoader) {
        let env_source = |key: &str| ConfigSource::Environment(ConfigLoader::env_var_name(key));

        if let Some(url) = loader.get_env_config("registry-url") {
            self.registry_url = url;
            self.sources.insert("registry-url", env_source("registry-url"));
        }
        if let Some(secs) = loader.get_env_u64("registry-timeout") {
            self.registry_timeout = Duration::from_secs(secs);
            self.sources.insert("registry-timeout", env_source("registry-timeout"));
        }
        if let Some(secs) = loader.get_env_u64("download-timeout") {
            self.download_timeout = Duration::from_secs(secs);
            self.sources.insert("download-timeout", env_source("download-timeout"));
        }
        if let Some(dir) = loader.get_env_path("staging-dir") {
            self.staging_dir = Some(dir);
            self.sources.insert("staging-dir", env_source("staging-dir"));
        }
        if let Some(limit) = loader.get_env_u64("max-download-bytes") {
            self.max_download_bytes = Self::limit_or_unbounded(limit);
            self.sources.insert("max-download-bytes", env_source("max-download-bytes"));
        }
        if let Some(proxy) = loader.get_env_config("proxy") {
            self.proxy = Some(proxy);
            self.sources.insert("proxy", env_source("proxy"));
        }
    }

    // 0 disables the size limit
    fn limit_or_unbounded(limit: u64) -> Option<u64> {
        (limit > 0).then_some(limit)
    }

    /// Where a setting came from; `Default` when never overridden
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.sources.get(key).cloned().unwrap_or(ConfigSource::Default)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root_dir.join("config.json")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root_dir.join("installed.json")
    }

    pub fn auth_path(&self) -> PathBuf {
        self.root_dir.join("auth.json")
    }

    pub fn log_db_path(&self) -> PathBuf {
        self.root_dir.join("state.db")
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// HTTP client configuration for registry requests
    pub fn http_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::new()
            .with_timeout(self.registry_timeout)
            .with_connect_timeout(self.connect_timeout);

        if let Some(proxy) = &self.proxy {
            config = config.with_proxy(proxy.clone());
        }
        if let Some(cafile) = &self.cafile {
            config = config.with_cafile(cafile.clone());
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::with_dirs("/home/ana", "/home/ana/.simplifia");

        assert_eq!(settings.registry_url, DEFAULT_REGISTRY_URL);
        assert_eq!(settings.registry_timeout, Duration::from_secs(30));
        assert_eq!(settings.download_timeout, Duration::from_secs(60));
        assert_eq!(settings.max_download_bytes, Some(DEFAULT_MAX_DOWNLOAD_BYTES));
        assert!(settings.staging_dir.is_none());
        assert_eq!(settings.source_of("registry-url"), ConfigSource::Default);
    }

    #[test]
    fn test_derived_paths() {
        let settings = Settings::with_dirs("/home/ana", "/home/ana/.simplifia");

        assert_eq!(settings.ledger_path(), PathBuf::from("/home/ana/.simplifia/installed.json"));
        assert_eq!(settings.auth_path(), PathBuf::from("/home/ana/.simplifia/auth.json"));
        assert_eq!(settings.log_db_path(), PathBuf::from("/home/ana/.simplifia/state.db"));
        assert_eq!(settings.config_path(), PathBuf::from("/home/ana/.simplifia/config.json"));
    }

    #[test]
    fn test_merge_raw_config_records_source() {
        let mut settings = Settings::with_dirs("/home/ana", "/home/ana/.simplifia");
        settings.merge_raw_config(RawConfig {
            registry_url: Some("https://mirror.example.com/manifest.json".to_string()),
            download_timeout: Some(120),
            max_download_bytes: Some(0),
            ..RawConfig::default()
        });

        assert_eq!(settings.registry_url, "https://mirror.example.com/manifest.json");
        assert_eq!(settings.download_timeout, Duration::from_secs(120));
        assert_eq!(settings.max_download_bytes, None);
        assert_eq!(settings.source_of("registry-url"), ConfigSource::File);
        assert_eq!(settings.source_of("registry-timeout"), ConfigSource::Default);
    }

    #[test]
    fn test_http_config_uses_registry_timeout() {
        let mut settings = Settings::with_dirs("/home/ana", "/home/ana/.simplifia");
        settings.proxy = Some("http://proxy:3128".to_string());

        let http = settings.http_config();
        assert_eq!(http.timeout, DEFAULT_REGISTRY_TIMEOUT);
        assert_eq!(http.proxy.as_deref(), Some("http://proxy:3128"));
    }
}
