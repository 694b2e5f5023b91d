use std::fs;

use url::Url;

use super::document::{PackDescriptor, RegistryDocument};
use super::PackRegistry;
use crate::error::{LookupFailure, PackError};
use crate::http::{HttpClient, HttpError};
use crate::Result;

/// Parsed registry document kept for the lifetime of one client
#[derive(Debug, Clone, Default)]
pub struct RegistryCache {
    document: Option<RegistryDocument>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that already holds a document
    pub fn with_document(document: RegistryDocument) -> Self {
        Self {
            document: Some(document),
        }
    }

    pub fn get(&self) -> Option<&RegistryDocument> {
        self.document.as_ref()
    }

    pub fn store(&mut self, document: RegistryDocument) {
        self.document = Some(document);
    }

    pub fn clear(&mut self) {
        self.document = None;
    }
}

/// Registry client backed by HTTP(S) or a local `file://` mirror
pub struct RegistryClient {
    http: HttpClient,
    url: String,
    bearer: Option<String>,
    cache: RegistryCache,
}

impl RegistryClient {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            bearer: None,
            cache: RegistryCache::new(),
        }
    }

    /// Send this token as `Authorization: Bearer` with registry requests
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token.filter(|t| !t.is_empty());
        self
    }

    /// Start from a pre-populated cache
    pub fn with_cache(mut self, cache: RegistryCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Return the registry document, fetching it unless cached.
    pub fn document(&mut self, force_refresh: bool) -> std::result::Result<&RegistryDocument, LookupFailure> {
        if force_refresh {
            self.cache.clear();
        }

        if self.cache.get().is_none() {
            let document = self.fetch()?;
            log::info!("Registry lists {} packs", document.packs.len());
            self.cache.store(document);
        }

        self.cache
            .get()
            .ok_or_else(|| LookupFailure::Unreachable("registry cache empty after fetch".to_string()))
    }

    fn fetch(&self) -> std::result::Result<RegistryDocument, LookupFailure> {
        log::debug!("Fetching registry from {}", self.url);

        if let Ok(parsed) = Url::parse(&self.url) {
            if parsed.scheme() == "file" {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| LookupFailure::Unreachable(format!("invalid file URL {}", self.url)))?;
                let contents = fs::read_to_string(&path)
                    .map_err(|e| LookupFailure::Unreachable(format!("{}: {}", path.display(), e)))?;
                return serde_json::from_str(&contents).map_err(|e| LookupFailure::Malformed(e.to_string()));
            }
        }

        self.http
            .get_json(&self.url, self.bearer.as_deref())
            .map_err(|e| match e {
                HttpError::JsonParse(message) => LookupFailure::Malformed(message),
                other => LookupFailure::Unreachable(other.to_string()),
            })
    }
}

impl PackRegistry for RegistryClient {
    fn resolve(&mut self, pack_id: &str) -> Result<PackDescriptor> {
        let not_found = |reason: LookupFailure| PackError::NotFound {
            pack_id: pack_id.to_string(),
            reason,
        };

        let document = self.document(false).map_err(not_found)?;
        document
            .find(pack_id)
            .cloned()
            .ok_or_else(|| not_found(LookupFailure::Unknown))
    }

    fn packs(&mut self, force_refresh: bool) -> Result<Vec<PackDescriptor>> {
        let document = self.document(force_refresh).map_err(PackError::Registry)?;
        Ok(document.packs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listing(version: &str) -> String {
        format!(
            r#"{{"packs": [{{"id": "whatsapp", "name": "WhatsApp Gold", "latest_version": "{}", "zip_url": "https://example.com/w.zip"}}]}}"#,
            version
        )
    }

    fn file_client(dir: &TempDir) -> RegistryClient {
        let path = dir.path().join("manifest.json");
        let url = Url::from_file_path(&path).unwrap().to_string();
        RegistryClient::new(HttpClient::new().unwrap(), url)
    }

    #[test]
    fn test_resolve_from_file_registry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("manifest.json"), listing("1.2.0")).unwrap();

        let mut client = file_client(&dir);
        let pack = client.resolve("whatsapp").unwrap();
        assert_eq!(pack.name, "WhatsApp Gold");
        assert_eq!(pack.latest_version, "1.2.0");
    }

    #[test]
    fn test_unknown_pack_is_not_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("manifest.json"), listing("1.2.0")).unwrap();

        let mut client = file_client(&dir);
        let err = client.resolve("crm").unwrap_err();
        assert!(matches!(
            err,
            PackError::NotFound { ref pack_id, reason: LookupFailure::Unknown } if pack_id == "crm"
        ));
    }

    #[test]
    fn test_unreachable_registry_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut client = file_client(&dir);

        let err = client.resolve("whatsapp").unwrap_err();
        assert!(matches!(
            err,
            PackError::NotFound { reason: LookupFailure::Unreachable(_), .. }
        ));
    }

    #[test]
    fn test_malformed_registry_is_not_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("manifest.json"), "{ broken").unwrap();

        let mut client = file_client(&dir);
        let err = client.resolve("whatsapp").unwrap_err();
        assert!(matches!(
            err,
            PackError::NotFound { reason: LookupFailure::Malformed(_), .. }
        ));
    }

    #[test]
    fn test_document_is_cached_until_forced_refresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, listing("1.0.0")).unwrap();

        let mut client = file_client(&dir);
        assert_eq!(client.resolve("whatsapp").unwrap().latest_version, "1.0.0");

        fs::write(&path, listing("2.0.0")).unwrap();
        assert_eq!(client.resolve("whatsapp").unwrap().latest_version, "1.0.0");

        let packs = client.packs(true).unwrap();
        assert_eq!(packs[0].latest_version, "2.0.0");
        assert_eq!(client.resolve("whatsapp").unwrap().latest_version, "2.0.0");
    }

    #[test]
    fn test_prepopulated_cache_skips_fetch() {
        let document: RegistryDocument = serde_json::from_str(&listing("3.1.0")).unwrap();
        let mut client = RegistryClient::new(HttpClient::new().unwrap(), "https://unused.invalid/manifest.json")
            .with_cache(RegistryCache::with_document(document));

        assert_eq!(client.resolve("whatsapp").unwrap().latest_version, "3.1.0");
    }
}
