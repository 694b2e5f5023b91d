use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The registry listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    /// Entries that do not parse are skipped, not fatal for the listing
    #[serde(default, deserialize_with = "lenient_packs")]
    pub packs: Vec<PackDescriptor>,
}

fn lenient_packs<'de, D>(deserializer: D) -> Result<Vec<PackDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<Value>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<PackDescriptor>(entry) {
            Ok(pack) if !pack.id.trim().is_empty() => Some(pack),
            Ok(_) => {
                log::warn!("Skipping registry entry {} with an empty id", index);
                None
            }
            Err(e) => {
                log::warn!("Skipping registry entry {}: {}", index, e);
                None
            }
        })
        .collect())
}

impl RegistryDocument {
    pub fn find(&self, pack_id: &str) -> Option<&PackDescriptor> {
        self.packs.iter().find(|p| p.id == pack_id)
    }
}

/// A pack available for installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPackEntry")]
pub struct PackDescriptor {
    pub id: String,
    pub name: String,
    pub latest_version: String,
    pub download_url: Option<String>,
    /// Hex SHA-256 of the artifact; `None` disables verification
    #[serde(rename = "sha256")]
    pub expected_digest: Option<String>,
    pub release_notes: Option<String>,
}

impl PackDescriptor {
    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Release notes cut to `max` characters with a trailing `...`
    pub fn release_notes_summary(&self, max: usize) -> String {
        let notes = self.release_notes.as_deref().unwrap_or("");
        if notes.chars().count() > max {
            let cut: String = notes.chars().take(max).collect();
            format!("{}...", cut)
        } else {
            notes.to_string()
        }
    }
}

/// Registry entries as published; older listings use `zip_url`
#[derive(Deserialize)]
struct RawPackEntry {
    id: String,
    #[serde(default)]
    name: String,
    /// Some listings publish bare numbers such as `2`
    #[serde(default)]
    latest_version: Option<Value>,
    #[serde(default)]
    zip_url: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    sha256: Option<String>,
    #[serde(default)]
    release_notes: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn version_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

impl From<RawPackEntry> for PackDescriptor {
    fn from(raw: RawPackEntry) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            latest_version: non_empty(raw.latest_version.and_then(version_text))
                .unwrap_or_else(|| "unknown".to_string()),
            download_url: non_empty(raw.download_url).or_else(|| non_empty(raw.zip_url)),
            expected_digest: non_empty(raw.sha256),
            release_notes: raw.release_notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_with_zip_url() {
        let doc: RegistryDocument = serde_json::from_str(
            r#"{
                "packs": [
                    {
                        "id": "whatsapp",
                        "name": "WhatsApp Gold",
                        "latest_version": "1.2.0",
                        "zip_url": "https://example.com/whatsapp-1.2.0.zip",
                        "sha256": "ABCDEF",
                        "release_notes": "First release"
                    },
                    { "id": "crm", "name": "CRM" }
                ]
            }"#,
        )
        .unwrap();

        let whatsapp = doc.find("whatsapp").unwrap();
        assert_eq!(whatsapp.download_url.as_deref(), Some("https://example.com/whatsapp-1.2.0.zip"));
        assert_eq!(whatsapp.expected_digest.as_deref(), Some("ABCDEF"));
        assert_eq!(whatsapp.latest_version, "1.2.0");

        let crm = doc.find("crm").unwrap();
        assert!(crm.download_url.is_none());
        assert!(crm.expected_digest.is_none());
        assert_eq!(crm.latest_version, "unknown");

        assert!(doc.find("missing").is_none());
    }

    #[test]
    fn test_bad_entries_do_not_hide_the_rest() {
        let doc: RegistryDocument = serde_json::from_str(
            r#"{
                "packs": [
                    {"name": "No id"},
                    {"id": "", "name": "Blank id"},
                    "not an object",
                    {"id": "crm", "latest_version": 2, "zip_url": "https://example.com/crm.zip"},
                    {"id": "whatsapp", "latest_version": "1.2.0"}
                ]
            }"#,
        )
        .unwrap();

        let ids: Vec<&str> = doc.packs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["crm", "whatsapp"]);
        assert_eq!(doc.find("crm").unwrap().latest_version, "2");
    }

    #[test]
    fn test_download_url_preferred_over_zip_url() {
        let pack: PackDescriptor = serde_json::from_str(
            r#"{"id": "x", "zip_url": "https://old", "download_url": "https://new", "sha256": ""}"#,
        )
        .unwrap();
        assert_eq!(pack.download_url.as_deref(), Some("https://new"));
        assert!(pack.expected_digest.is_none());
    }

    #[test]
    fn test_display_name_and_notes_summary() {
        let pack = PackDescriptor {
            id: "rules".to_string(),
            name: String::new(),
            latest_version: "1.0.0".to_string(),
            download_url: None,
            expected_digest: None,
            release_notes: Some("a".repeat(60)),
        };
        assert_eq!(pack.display_name(), "rules");
        assert_eq!(pack.release_notes_summary(50), format!("{}...", "a".repeat(50)));
    }
}
