//! List command - packs published in the registry.

use anyhow::Result;
use clap::Args;

use crate::context::Context;
use crate::install::report_failure;

const NOTES_WIDTH: usize = 50;

#[derive(Args, Debug)]
pub struct ListArgs {}

pub fn execute(_args: ListArgs, ctx: &Context) -> Result<i32> {
    let output = &ctx.output;
    let mut manager = ctx.manager()?;

    let packs = match manager.available(false) {
        Ok(packs) => packs,
        Err(e) => {
            report_failure(output, "", &e);
            return Ok(1);
        }
    };

    if packs.is_empty() {
        output.writeln("The registry lists no packs.");
        return Ok(0);
    }

    let installed = manager.ledger().get_all();
    let widths = [16, 28, 10, 10];

    output.section("Available packs");
    output.table_row(&["ID", "NAME", "LATEST", "INSTALLED"], &widths);
    for pack in &packs {
        let current = installed
            .get(&pack.id)
            .map(|record| record.version.as_str())
            .unwrap_or("-");
        output.table_row(
            &[pack.id.as_str(), pack.display_name(), pack.latest_version.as_str(), current],
            &widths,
        );

        let notes = pack.release_notes_summary(NOTES_WIDTH);
        if !notes.is_empty() {
            output.hint(&notes);
        }
    }

    Ok(0)
}
