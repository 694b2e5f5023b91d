use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Scratch directory for one install attempt, deleted when dropped
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create under `parent`, or the system temp dir when `None`
    pub fn create(parent: Option<&Path>) -> std::io::Result<Self> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("simplifia-");
            builder
        };

        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        log::debug!("Staging in {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn archive_path(&self, pack_id: &str) -> PathBuf {
        let file_name = pack_id.replace(['/', '\\'], "_");
        self.dir.path().join(format!("{}.zip", file_name))
    }

    pub fn extract_dir(&self) -> PathBuf {
        self.dir.path().join("extracted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_on_drop() {
        let parent = TempDir::new().unwrap();
        let staging = StagingArea::create(Some(parent.path())).unwrap();
        let path = staging.path().to_path_buf();

        std::fs::create_dir_all(staging.extract_dir().join("rules")).unwrap();
        std::fs::write(staging.archive_path("crm"), b"zip").unwrap();
        assert!(path.exists());

        drop(staging);
        assert!(!path.exists());
    }

    #[test]
    fn test_archive_name_is_flat() {
        let staging = StagingArea::create(None).unwrap();
        let archive = staging.archive_path("../evil");
        assert_eq!(archive.parent(), Some(staging.path()));
    }
}
