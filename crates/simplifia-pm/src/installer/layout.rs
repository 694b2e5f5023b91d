//! Copies a pack's content categories to their destinations.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::pack::InstallSpec;
use crate::util::{is_contained_relative, resolve_template};
use crate::{PackError, Result};

/// One validated `copy_to` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRule {
    pub category: String,
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Number of files written
    Copied { files: usize },
    /// The pack declares the category but ships no such directory or file
    SkippedMissingSource,
}

/// What happened to one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyStep {
    pub category: String,
    pub destination: PathBuf,
    pub outcome: CopyOutcome,
}

/// Installs the `copy_to` layout of an extracted pack
pub struct LayoutInstaller {
    home_dir: PathBuf,
    root_dir: PathBuf,
}

impl LayoutInstaller {
    pub fn new(home_dir: impl Into<PathBuf>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            root_dir: root_dir.into(),
        }
    }

    /// Expand a destination template and check it stays inside the home
    /// directory or the workspace root. Relative templates join the root.
    pub fn resolve_destination(&self, category: &str, template: &str) -> Result<PathBuf> {
        resolve_template(template, &self.home_dir, &self.root_dir).map_err(|message| {
            PackError::InvalidLayout {
                category: category.to_string(),
                message,
            }
        })
    }

    /// Validate every entry before anything is copied
    pub fn plan(&self, pack_root: &Path, spec: &InstallSpec) -> Result<Vec<CopyRule>> {
        spec.copy_to
            .iter()
            .map(|(category, template)| {
                let relative = Path::new(category);
                if category.trim().is_empty() || !is_contained_relative(relative) {
                    return Err(PackError::InvalidLayout {
                        category: category.clone(),
                        message: "category must be a relative path inside the pack".to_string(),
                    });
                }

                Ok(CopyRule {
                    category: category.clone(),
                    source: pack_root.join(relative),
                    destination: self.resolve_destination(category, template)?,
                })
            })
            .collect()
    }

    /// Copy every category in declared order, overwriting existing files
    pub fn install(&self, pack_root: &Path, spec: &InstallSpec) -> Result<Vec<CopyStep>> {
        let rules = self.plan(pack_root, spec)?;
        let mut steps = Vec::with_capacity(rules.len());

        for rule in rules {
            let outcome = if !rule.source.exists() {
                log::warn!(
                    "Pack has no '{}' content at {}, skipping",
                    rule.category,
                    rule.source.display()
                );
                CopyOutcome::SkippedMissingSource
            } else {
                let files = copy_tree(&rule.source, &rule.destination).map_err(|source| {
                    PackError::Install {
                        category: rule.category.clone(),
                        source,
                    }
                })?;
                log::info!(
                    "Installed {} ({} files) -> {}",
                    rule.category,
                    files,
                    rule.destination.display()
                );
                CopyOutcome::Copied { files }
            };

            steps.push(CopyStep {
                category: rule.category,
                destination: rule.destination,
                outcome,
            });
        }

        Ok(steps)
    }
}

/// Copy a file or merge a directory tree into `dest`
fn copy_tree(source: &Path, dest: &Path) -> io::Result<usize> {
    if source.is_file() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        copy_file(source, dest)?;
        return Ok(1);
    }

    fs::create_dir_all(dest)?;
    let mut files = 0;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            copy_file(entry.path(), &target)?;
            files += 1;
        }
    }

    Ok(files)
}

/// Copy contents, modification time and permissions.
///
/// Read-only files are written and stamped first, then get their final mode,
/// so a previously installed read-only copy can be overwritten too.
fn copy_file(source: &Path, dest: &Path) -> io::Result<()> {
    if let Ok(existing) = fs::metadata(dest) {
        if existing.permissions().readonly() {
            fs::set_permissions(dest, owner_writable(existing.permissions()))?;
        }
    }

    fs::copy(source, dest)?;

    let metadata = fs::metadata(source)?;
    let permissions = metadata.permissions();
    if permissions.readonly() {
        fs::set_permissions(dest, owner_writable(permissions.clone()))?;
    }

    File::options().write(true).open(dest)?.set_modified(metadata.modified()?)?;

    if permissions.readonly() {
        fs::set_permissions(dest, permissions)?;
    }
    Ok(())
}

#[cfg(unix)]
fn owner_writable(permissions: fs::Permissions) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    fs::Permissions::from_mode(permissions.mode() | 0o200)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn owner_writable(mut permissions: fs::Permissions) -> fs::Permissions {
    permissions.set_readonly(false);
    permissions
}
