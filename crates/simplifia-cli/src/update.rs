//! Update command - bring installed packs to the registry's latest version.

use anyhow::Result;
use clap::Args;

use simplifia_pm::cli::InstallProgress;
use simplifia_pm::UpdateOutcome;

use crate::context::Context;
use crate::install::{report_failure, report_install};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Pack to update
    #[arg(value_name = "PACK", required_unless_present = "all", conflicts_with = "all")]
    pub pack_id: Option<String>,

    /// Update every installed pack
    #[arg(long)]
    pub all: bool,
}

pub fn execute(args: UpdateArgs, ctx: &Context) -> Result<i32> {
    let output = &ctx.output;
    let mut manager = ctx.manager()?;

    let Some(pack_id) = args.pack_id.filter(|_| !args.all) else {
        let installed = manager.ledger().get_all();
        if installed.is_empty() {
            output.warning("No packs installed to update");
            return Ok(0);
        }

        output.headline(&format!("Updating {} packs", installed.len()));
        let results = manager.update_all(&|_, _| {});

        let mut failed = 0;
        for (pack_id, result) in &results {
            match result {
                Ok(outcome) => report_update(ctx, outcome),
                Err(e) => {
                    failed += 1;
                    report_failure(output, pack_id, e);
                }
            }
        }

        if failed > 0 {
            output.warning(&format!("{} of {} updates failed", failed, results.len()));
            return Ok(1);
        }
        return Ok(0);
    };

    let progress = InstallProgress::new(&pack_id, ctx.show_progress());
    let result = manager.update_with(&pack_id, &|event| progress.handle(event));
    progress.finish();

    match result {
        Ok(outcome) => {
            report_update(ctx, &outcome);
            Ok(0)
        }
        Err(e) => {
            report_failure(output, &pack_id, &e);
            Ok(1)
        }
    }
}

fn report_update(ctx: &Context, outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::UpToDate { pack_id, version } => {
            ctx.output.success(&format!("{} is already at the latest version ({})", pack_id, version))
        }
        UpdateOutcome::Updated { from, outcome } => {
            ctx.output.headline(&format!(
                "Updated {}: {} -> {}",
                outcome.pack_id, from, outcome.record.version
            ));
            report_install(&ctx.output, outcome);
        }
    }
}

