//! Path helpers shared by the layout installer and the migration runner.

use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` in a destination template to `home`.
///
/// # Examples
///
/// ```
/// use simplifia_pm::util::expand_home;
/// use std::path::{Path, PathBuf};
///
/// let home = Path::new("/home/ana");
/// assert_eq!(expand_home("~/.simplifia/rules", home), PathBuf::from("/home/ana/.simplifia/rules"));
/// assert_eq!(expand_home("/opt/packs", home), PathBuf::from("/opt/packs"));
/// ```
pub fn expand_home(template: &str, home: &Path) -> PathBuf {
    let home_str = home.to_string_lossy();
    let expanded = shellexpand::tilde_with_context(template, || Some(home_str.as_ref()));
    PathBuf::from(expanded.as_ref())
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root, so the result never climbs above
/// the first component of an absolute path.
///
/// # Examples
///
/// ```
/// use simplifia_pm::util::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(normalize_path(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
/// assert_eq!(normalize_path(Path::new("/a/../../etc")), PathBuf::from("/etc"));
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }

    out
}

/// Expand a destination template and check it stays inside `home` or `root`.
///
/// Relative templates join `root`. The error carries a message for the caller
/// to wrap in its own error type.
pub fn resolve_template(template: &str, home: &Path, root: &Path) -> Result<PathBuf, String> {
    let template = template.trim();
    if template.is_empty() {
        return Err("destination is empty".to_string());
    }

    let expanded = expand_home(template, home);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        root.join(expanded)
    };
    let destination = normalize_path(&absolute);

    if is_within(&destination, home) || is_within(&destination, root) {
        Ok(destination)
    } else {
        Err(format!(
            "{} is outside {} and {}",
            destination.display(),
            home.display(),
            root.display()
        ))
    }
}

/// Whether `path` lies under `base` once both are normalised.
pub fn is_within(path: &Path, base: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(base))
}

/// Whether a relative path stays inside whatever directory it is joined to.
///
/// Rejects absolute paths, drive prefixes and any `..` component.
pub fn is_contained_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
