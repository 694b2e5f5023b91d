//! Install command - download, verify and install a pack.

use anyhow::Result;
use clap::Args;

use simplifia_pm::cli::{format_bytes, InstallProgress, Output};
use simplifia_pm::error::{ExtractionError, FetchError};
use simplifia_pm::installer::{CopyOutcome, MigrationOutcome};
use simplifia_pm::{InstallOutcome, PackError, PackManager, Verification};

use crate::context::Context;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Pack identifier, as shown by `simplifia list`
    #[arg(value_name = "PACK")]
    pub pack_id: String,

    /// Reinstall even if the pack is already installed
    #[arg(short, long)]
    pub force: bool,
}

pub fn execute(args: InstallArgs, ctx: &Context) -> Result<i32> {
    let output = &ctx.output;

    let auth = match ctx.auth() {
        Some(auth) => auth,
        None => {
            report_failure(output, &args.pack_id, &PackError::Unauthenticated);
            return Ok(1);
        }
    };
    if let Err(e) = auth.check_entitlement(&args.pack_id) {
        report_failure(output, &args.pack_id, &e);
        return Ok(1);
    }

    let mut manager = ctx.manager()?;
    if let Some(existing) = manager.ledger().get(&args.pack_id) {
        output.verbose(&format!(
            "{} {} is already installed, reinstalling",
            args.pack_id, existing.version
        ));
    }

    output.headline(&format!("Installing {}", args.pack_id));
    run_install(&mut manager, &args.pack_id, args.force, ctx)
}

/// Run one install with a progress display, printing the result
pub fn run_install(manager: &mut PackManager, pack_id: &str, force: bool, ctx: &Context) -> Result<i32> {
    let progress = InstallProgress::new(pack_id, ctx.show_progress());
    let result = manager.install_with(pack_id, force, &|event| progress.handle(event));
    progress.finish();

    match result {
        Ok(outcome) => {
            report_install(&ctx.output, &outcome);
            Ok(0)
        }
        Err(e) => {
            report_failure(&ctx.output, pack_id, &e);
            Ok(1)
        }
    }
}

pub fn report_install(output: &Output, outcome: &InstallOutcome) {
    output.verbose(&format!("Downloaded {}", format_bytes(outcome.bytes_downloaded)));

    match &outcome.verification {
        Verification::Verified { .. } => output.success("SHA-256 verified"),
        Verification::Skipped => output.hint("No SHA-256 published for this release, verification skipped"),
    }

    for step in &outcome.copied {
        match step.outcome {
            CopyOutcome::Copied { files } => output.success(&format!(
                "{}/ -> {} ({} files)",
                step.category,
                step.destination.display(),
                files
            )),
            CopyOutcome::SkippedMissingSource => {
                output.verbose(&format!("{}/ not shipped in this pack", step.category))
            }
        }
    }

    if let Some(report) = &outcome.migrations {
        for step in &report.steps {
            match &step.outcome {
                MigrationOutcome::Applied => output.verbose(&format!("Applied {}", step.script)),
                MigrationOutcome::Missing => output.verbose(&format!("{} not found in pack", step.script)),
                MigrationOutcome::Failed(err) => output.warning(&err.to_string()),
            }
        }
        if let Some(database) = &report.database {
            output.success(&format!(
                "{} migrations applied to {}",
                report.applied(),
                database.display()
            ));
        }
    }

    output.success(&format!(
        "{} {} installed",
        outcome.record.name, outcome.record.version
    ));
    if let Some(report) = &outcome.report {
        output.hint(&format!("Report: {}", report.display()));
    }
}

/// Print a failure with the details needed to act on it
pub fn report_failure(output: &Output, pack_id: &str, err: &PackError) {
    output.error(&err.to_string());

    match err {
        PackError::NotFound { .. } => output.hint("Run `simplifia list` to see available packs"),
        PackError::DigestMismatch { expected, actual } => {
            output.hint(&format!("expected: {}", expected));
            output.hint(&format!("received: {}", actual));
            output.hint("The download was discarded; nothing was installed");
        }
        PackError::Fetch(FetchError::Timeout { .. }) => {
            output.hint("Check your connection, or raise SIMPLIFIA_DOWNLOAD_TIMEOUT")
        }
        PackError::Extraction(ExtractionError::ManifestMissing { .. }) => {
            output.hint("The archive does not look like a SimplifIA pack")
        }
        PackError::Install { .. } => {
            output.hint("Categories copied before the failure were left in place")
        }
        PackError::Unauthenticated => output.hint("No activation found; activate SimplifIA before installing packs"),
        PackError::NotEntitled { .. } => {
            output.hint(&format!("Your activation does not include '{}'", pack_id))
        }
        PackError::NotInstalled { .. } => {
            output.hint(&format!("Use `simplifia install {}` to install it", pack_id))
        }
        _ => {}
    }
}
