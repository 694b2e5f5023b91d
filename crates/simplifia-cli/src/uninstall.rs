//! Uninstall command - remove a pack's folders and ledger record.

use anyhow::{Context as _, Result};
use clap::Args;
use dialoguer::Confirm;

use simplifia_pm::{DataDisposition, RemovalOutcome};

use crate::context::Context;

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Pack to remove
    #[arg(value_name = "PACK")]
    pub pack_id: String,

    /// Keep the pack's local database (the default)
    #[arg(long, conflicts_with = "purge_data")]
    pub keep_data: bool,

    /// Also delete the pack's local database
    #[arg(long)]
    pub purge_data: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub fn execute(args: UninstallArgs, ctx: &Context) -> Result<i32> {
    let output = &ctx.output;
    let mut manager = ctx.manager()?;

    let Some(record) = manager.ledger().get(&args.pack_id) else {
        output.warning(&format!("Pack '{}' is not installed", args.pack_id));
        return Ok(1);
    };

    output.headline(&format!("Removing {} {}", record.name, record.version));

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()
            .context("Could not read confirmation; pass --yes to skip it")?;
        if !confirmed {
            output.writeln("Cancelled.");
            return Ok(0);
        }
    }

    let outcome = manager.uninstall(&args.pack_id, args.purge_data)?;

    for step in &outcome.folders {
        match &step.outcome {
            RemovalOutcome::Removed => output.success(&format!("Removed {}", step.path.display())),
            RemovalOutcome::Absent => output.verbose(&format!("{} not present", step.path.display())),
            RemovalOutcome::Failed(reason) => {
                output.warning(&format!("Could not remove {}: {}", step.path.display(), reason))
            }
        }
    }
    output.success("Removed from installed.json");

    match &outcome.data {
        DataDisposition::NoData => {}
        DataDisposition::Kept(path) => {
            output.hint(&format!("Local data kept at {} (use --purge-data to delete it)", path.display()))
        }
        DataDisposition::Purged(path) => output.success(&format!("Deleted {}", path.display())),
        DataDisposition::PurgeFailed { path, message } => {
            output.warning(&format!("Could not delete {}: {}", path.display(), message))
        }
        DataDisposition::Retained { path, reason } => {
            output.warning(&format!("Kept {} because {}", path.display(), reason))
        }
    }

    output.success(&format!("Pack {} removed", outcome.pack_id));
    Ok(0)
}
