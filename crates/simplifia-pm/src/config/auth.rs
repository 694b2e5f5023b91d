//! Activation state written by the `activate` flow.
//!
//! # auth.json format
//!
//! ```json
//! {
//!     "session_token": "eyJhbGciOi...",
//!     "entitlements": ["whatsapp", "crm"],
//!     "product": "gold",
//!     "niche": "clinics",
//!     "created_at": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! Only loading is implemented here; the login exchange lives outside
//! this crate.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PackError, Result};

/// Pack that every activation may install
pub const BASE_PACK: &str = "base";
/// Entitlement granting every pack
pub const ALL_PACKS: &str = "all";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthState {
    #[serde(default)]
    pub session_token: String,

    #[serde(default)]
    pub entitlements: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl AuthState {
    /// Load the activation file.
    ///
    /// Missing, unreadable or token-less files all mean "not activated".
    pub fn load<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).ok()?;

        match serde_json::from_str::<AuthState>(&contents) {
            Ok(state) if !state.session_token.is_empty() => Some(state),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Ignoring unreadable auth file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load the activation file or fail with `Unauthenticated`
    pub fn require<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(path).ok_or(PackError::Unauthenticated)
    }

    /// Opaque token sent to the registry
    pub fn bearer_token(&self) -> &str {
        &self.session_token
    }

    pub fn is_entitled(&self, pack_id: &str) -> bool {
        pack_id == BASE_PACK
            || self
                .entitlements
                .iter()
                .any(|e| e == pack_id || e == ALL_PACKS)
    }

    /// Fail with `NotEntitled` unless the pack may be installed
    pub fn check_entitlement(&self, pack_id: &str) -> Result<()> {
        if self.is_entitled(pack_id) {
            Ok(())
        } else {
            Err(PackError::NotEntitled {
                pack_id: pack_id.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state(entitlements: &[&str]) -> AuthState {
        AuthState {
            session_token: "tok".to_string(),
            entitlements: entitlements.iter().map(|s| s.to_string()).collect(),
            ..AuthState::default()
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(AuthState::load(dir.path().join("auth.json")).is_none());
    }

    #[test]
    fn test_load_without_token_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, r#"{"session_token": "", "entitlements": ["all"]}"#).unwrap();
        assert!(AuthState::load(&path).is_none());
        assert!(matches!(AuthState::require(&path), Err(PackError::Unauthenticated)));
    }

    #[test]
    fn test_load_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(
            &path,
            r#"{"session_token": "abc", "entitlements": ["whatsapp"], "product": "gold"}"#,
        )
        .unwrap();

        let auth = AuthState::load(&path).unwrap();
        assert_eq!(auth.bearer_token(), "abc");
        assert_eq!(auth.product.as_deref(), Some("gold"));
        assert!(auth.niche.is_none());
    }

    #[test]
    fn test_corrupt_file_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, "not json").unwrap();
        assert!(AuthState::load(&path).is_none());
    }

    #[test]
    fn test_entitlements() {
        let auth = state(&["whatsapp"]);
        assert!(auth.is_entitled("whatsapp"));
        assert!(auth.is_entitled(BASE_PACK));
        assert!(!auth.is_entitled("crm"));
        assert!(matches!(
            auth.check_entitlement("crm"),
            Err(PackError::NotEntitled { pack_id }) if pack_id == "crm"
        ));

        let all = state(&[ALL_PACKS]);
        assert!(all.is_entitled("crm"));
    }
}
