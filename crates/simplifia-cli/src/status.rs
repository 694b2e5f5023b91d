//! Status command - list installed packs.

use anyhow::Result;
use clap::Args;

use crate::context::Context;

#[derive(Args, Debug)]
pub struct StatusArgs {}

pub fn execute(_args: StatusArgs, ctx: &Context) -> Result<i32> {
    let output = &ctx.output;

    match ctx.auth() {
        Some(auth) => {
            let product = auth.product.as_deref().unwrap_or("-");
            output.success(&format!("Activated ({})", product));
            if !auth.entitlements.is_empty() {
                output.hint(&format!("Entitlements: {}", auth.entitlements.join(", ")));
            }
        }
        None => output.warning("Not activated"),
    }

    let ledger = simplifia_pm::Ledger::new(ctx.settings.ledger_path());
    let installed = ledger.get_all();

    output.section("Installed packs");
    if installed.is_empty() {
        output.writeln("No packs installed.");
        output.hint("Run `simplifia list` to see what is available");
        return Ok(0);
    }

    let widths = [20, 12, 24];
    output.table_row(&["PACK", "VERSION", "INSTALLED"], &widths);
    for (pack_id, record) in &installed {
        output.table_row(
            &[pack_id.as_str(), record.version.as_str(), record.installed_at.as_str()],
            &widths,
        );
        if record.name != *pack_id {
            output.verbose(&format!("  {}", record.name));
        }
    }

    Ok(0)
}
