/// Integration tests for settings resolution
///
/// These tests verify that settings are layered correctly from defaults,
/// `<root>/config.json` and `SIMPLIFIA_*` environment variables.

use simplifia_pm::config::{AuthState, ConfigLoader, ConfigSource, Settings, DEFAULT_REGISTRY_URL};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_settings_defaults_without_environment() {
    let settings = Settings::build(false).unwrap();

    assert!(settings.root_dir.ends_with(".simplifia"));
    assert_eq!(settings.ledger_path(), settings.root_dir.join("installed.json"));
}

#[test]
fn test_config_loader_env_disabled() {
    let loader = ConfigLoader::new(false);

    assert_eq!(loader.get_env("SIMPLIFIA_HOME"), None);
    assert_eq!(loader.get_env_config("registry-url"), None);
}

#[test]
fn test_load_config_file_ignores_unknown_keys() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("config.json");

    fs::write(
        &config_file,
        r#"{
            "provider": "openai",
            "api_key": "sk-test",
            "registry_url": "https://mirror.example.com/manifest.json",
            "download_timeout": 90
        }"#,
    )
    .unwrap();

    let raw = ConfigLoader::new(false).load_config_file(&config_file).unwrap();
    assert_eq!(raw.registry_url.as_deref(), Some("https://mirror.example.com/manifest.json"));
    assert_eq!(raw.download_timeout, Some(90));
    assert!(raw.registry_timeout.is_none());
}

#[test]
fn test_malformed_config_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("config.json");
    fs::write(&config_file, "{ not json").unwrap();

    assert!(ConfigLoader::new(false).load_config_file(&config_file).is_err());
}

// The only test in this binary that touches the process environment.
#[test]
fn test_environment_overrides_file() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.json"),
        r#"{"registry_url": "https://file.example.com/manifest.json", "registry_timeout": 5, "download_timeout": 90}"#,
    )
    .unwrap();

    env::set_var("SIMPLIFIA_HOME", root.path());
    env::set_var("SIMPLIFIA_DOWNLOAD_TIMEOUT", "300");
    env::set_var("SIMPLIFIA_MAX_DOWNLOAD_BYTES", "0");
    env::set_var("SIMPLIFIA_PROXY", "");

    let settings = Settings::build(true);

    env::remove_var("SIMPLIFIA_HOME");
    env::remove_var("SIMPLIFIA_DOWNLOAD_TIMEOUT");
    env::remove_var("SIMPLIFIA_MAX_DOWNLOAD_BYTES");
    env::remove_var("SIMPLIFIA_PROXY");

    let settings = settings.unwrap();
    assert_eq!(settings.root_dir, PathBuf::from(root.path()));
    assert_eq!(settings.registry_url, "https://file.example.com/manifest.json");
    assert_eq!(settings.registry_timeout, Duration::from_secs(5));
    assert_eq!(settings.download_timeout, Duration::from_secs(300));
    assert_eq!(settings.max_download_bytes, None);
    assert!(settings.proxy.is_none());

    assert_eq!(settings.source_of("registry-url"), ConfigSource::File);
    assert_eq!(
        settings.source_of("download-timeout"),
        ConfigSource::Environment("SIMPLIFIA_DOWNLOAD_TIMEOUT".to_string())
    );
    assert_eq!(settings.source_of("proxy"), ConfigSource::Default);
}

#[test]
fn test_with_dirs_uses_default_registry() {
    let settings = Settings::with_dirs("/home/ana", "/srv/simplifia");
    assert_eq!(settings.registry_url, DEFAULT_REGISTRY_URL);
    assert_eq!(settings.auth_path(), PathBuf::from("/srv/simplifia/auth.json"));
}

#[test]
fn test_auth_file_in_root() {
    let root = TempDir::new().unwrap();
    let settings = Settings::with_dirs(root.path(), root.path());

    assert!(AuthState::load(settings.auth_path()).is_none());

    fs::write(
        settings.auth_path(),
        r#"{"session_token": "tok", "entitlements": ["whatsapp"], "product": "gold", "niche": "clinic"}"#,
    )
    .unwrap();

    let auth = AuthState::load(settings.auth_path()).unwrap();
    assert!(auth.is_entitled("whatsapp"));
    assert!(auth.is_entitled("base"));
    assert!(!auth.is_entitled("crm"));
}
