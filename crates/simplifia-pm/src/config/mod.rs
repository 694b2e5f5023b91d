//! Configuration management
//!
//! Settings are resolved from three sources, highest priority first:
//!
//! 1. Environment variables (`SIMPLIFIA_*`)
//! 2. `<root>/config.json`
//! 3. Built-in defaults
//!
//! The workspace root defaults to `~/.simplifia` and can be moved with
//! `SIMPLIFIA_HOME`. The activation file `auth.json` lives in the same root.
//!
//! # Example
//!
//! ```rust,no_run
//! use simplifia_pm::config::{AuthState, Settings};
//!
//! let settings = Settings::build(true).unwrap();
//! println!("Ledger: {}", settings.ledger_path().display());
//!
//! if let Some(auth) = AuthState::load(settings.auth_path()) {
//!     println!("Entitled to whatsapp: {}", auth.is_entitled("whatsapp"));
//! }
//! ```

mod auth;
mod settings;
mod source;

pub use auth::{AuthState, ALL_PACKS, BASE_PACK};
pub use settings::{
    Settings, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_MAX_DOWNLOAD_BYTES,
    DEFAULT_REGISTRY_TIMEOUT, DEFAULT_REGISTRY_URL,
};
pub use source::{ConfigLoader, ConfigSource, RawConfig};
