//! Zip extraction and `pack.json` discovery.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use crate::error::ExtractionError;
use crate::pack::{Manifest, MANIFEST_FILE};

/// An extracted pack: the directory holding `pack.json` and its contents
#[derive(Debug, Clone)]
pub struct ExtractedPack {
    /// Effective pack root; category sources resolve against it
    pub root: PathBuf,
    pub manifest: Manifest,
}

/// Unpacks a downloaded artifact into a staging directory
pub trait ArchiveExtractor {
    fn extract(&self, archive: &Path, target: &Path) -> Result<ExtractedPack, ExtractionError>;
}

/// Zip archive extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ZipExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Turn an entry name into a relative path, rejecting anything that
    /// could land outside the target. Returns `None` for empty names.
    fn sanitize_entry(name: &str) -> Result<Option<PathBuf>, ExtractionError> {
        let normalized = name.replace('\\', "/");
        let mut relative = PathBuf::new();

        for component in Path::new(&normalized).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ExtractionError::PathTraversal {
                        entry: name.to_string(),
                    });
                }
            }
        }

        Ok(if relative.as_os_str().is_empty() {
            None
        } else {
            Some(relative)
        })
    }

    /// Extract every entry. All names are validated before anything is
    /// written, so a hostile archive leaves the target untouched.
    pub fn unpack(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError> {
        let file = File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| ExtractionError::Corrupt(format!("Failed to open zip: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let name = archive
                .name_for_index(i)
                .ok_or_else(|| ExtractionError::Corrupt(format!("Missing name for entry {}", i)))?;
            entries.push(Self::sanitize_entry(name)?);
        }

        std::fs::create_dir_all(dest_dir)?;
        let dest_dir_canonical = dest_dir.canonicalize()?;
        let mut written = 0;

        for (i, relative) in entries.into_iter().enumerate() {
            let Some(relative) = relative else {
                continue;
            };

            let mut entry = archive
                .by_index(i)
                .map_err(|e| ExtractionError::Corrupt(format!("Failed to read zip entry: {}", e)))?;
            let outpath = dest_dir.join(&relative);

            if entry.is_dir() {
                std::fs::create_dir_all(&outpath)?;
                continue;
            }

            let parent = outpath.parent().unwrap_or(dest_dir);
            std::fs::create_dir_all(parent)?;

            // Symlinked parents could still redirect the write
            if !parent.canonicalize()?.starts_with(&dest_dir_canonical) {
                return Err(ExtractionError::PathTraversal {
                    entry: relative.display().to_string(),
                });
            }

            let mut outfile = File::create(&outpath)?;
            std::io::copy(&mut entry, &mut outfile).map_err(|e| {
                ExtractionError::Corrupt(format!("Failed to extract {}: {}", relative.display(), e))
            })?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
                }
            }

            written += 1;
        }

        log::debug!("Extracted {} files to {}", written, dest_dir.display());
        Ok(written)
    }

    /// Find the directory holding `pack.json`: the target itself, else
    /// exactly one subdirectory level below it (first by name).
    pub fn locate_root(target: &Path) -> Result<PathBuf, ExtractionError> {
        if target.join(MANIFEST_FILE).is_file() {
            return Ok(target.to_path_buf());
        }

        let mut subdirs: Vec<PathBuf> = std::fs::read_dir(target)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        subdirs.sort();

        subdirs
            .into_iter()
            .find(|dir| dir.join(MANIFEST_FILE).is_file())
            .ok_or_else(|| ExtractionError::ManifestMissing {
                searched: target.to_path_buf(),
            })
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path, target: &Path) -> Result<ExtractedPack, ExtractionError> {
        self.unpack(archive, target)?;

        let root = Self::locate_root(target)?;
        let manifest = Manifest::from_file(&root.join(MANIFEST_FILE))?;

        Ok(ExtractedPack { root, manifest })
    }
}
