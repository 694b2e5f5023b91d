//! The first-run report written to the workspace root after an install.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::installer::{CopyOutcome, CopyStep};
use crate::ledger::InstalledPackRecord;

pub const FIRST_RUN_REPORT: &str = "RELATORIO-PRIMEIRO-USO.md";

/// Markdown summary of an install: pack, version, date, installed
/// folders and the commands a user needs next.
pub fn render_first_run_report(pack_id: &str, record: &InstalledPackRecord, copied: &[CopyStep]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# SimplifIA - Install report\n");
    let _ = writeln!(out, "**Pack:** {}", record.name);
    let _ = writeln!(out, "**Version:** {}", record.version);
    let _ = writeln!(out, "**Installed at:** {}\n", record.installed_at);

    let _ = writeln!(out, "## Installed files\n");
    let installed: Vec<&CopyStep> = copied
        .iter()
        .filter(|step| matches!(step.outcome, CopyOutcome::Copied { .. }))
        .collect();
    if installed.is_empty() {
        let _ = writeln!(out, "This pack did not ship any files.");
    }
    for step in installed {
        let _ = writeln!(out, "- {}: `{}`", step.category, step.destination.display());
    }
    if let Some(db_path) = &record.db_path {
        let _ = writeln!(out, "- database: `{}`", db_path.display());
    }

    let _ = writeln!(out, "\n## Useful commands\n");
    let _ = writeln!(out, "```bash");
    let _ = writeln!(out, "# Show installed packs\nsimplifia status\n");
    let _ = writeln!(out, "# Update this pack\nsimplifia update {}\n", pack_id);
    let _ = writeln!(out, "# Show recent activity\nsimplifia logs {}", pack_id);
    let _ = writeln!(out, "```\n");

    let _ = writeln!(out, "## Safe mode\n");
    let _ = writeln!(out, "Workflows produce drafts and suggestions for you to review.");
    let _ = writeln!(out, "Nothing is sent automatically by default.");
    out
}

/// Write the report into `root`, replacing the previous one
pub fn write_first_run_report(
    root: &Path,
    pack_id: &str,
    record: &InstalledPackRecord,
    copied: &[CopyStep],
) -> io::Result<PathBuf> {
    fs::create_dir_all(root)?;
    let path = root.join(FIRST_RUN_REPORT);
    fs::write(&path, render_first_run_report(pack_id, record, copied))?;
    log::debug!("Wrote first-run report to {}", path.display());
    Ok(path)
}
