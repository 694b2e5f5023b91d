//! Logs command - recent workflow interactions from the local store.

use anyhow::Result;
use clap::Args;

use simplifia_pm::logs::DEFAULT_LOG_LIMIT;
use simplifia_pm::{Interaction, LogQuery, LogStore};

use crate::context::Context;

const PREVIEW_WIDTH: usize = 30;

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Only show interactions for this pack
    #[arg(value_name = "PACK")]
    pub pack_id: Option<String>,

    /// Number of entries to show
    #[arg(short = 'n', long, default_value_t = DEFAULT_LOG_LIMIT)]
    pub lines: usize,
}

pub fn execute(args: LogsArgs, ctx: &Context) -> Result<i32> {
    let output = &ctx.output;
    let store = LogStore::new(ctx.settings.log_db_path());

    match store.recent(args.pack_id.as_deref(), args.lines)? {
        LogQuery::NoDatabase => {
            output.writeln("No logs yet.");
            output.hint("Logs appear once a workflow has run");
        }
        LogQuery::NoTable => {
            output.writeln("The interactions table has not been created yet.");
            output.hint("Run a pack workflow to start recording interactions");
        }
        LogQuery::Rows(rows) if rows.is_empty() => output.writeln("No matching logs."),
        LogQuery::Rows(rows) => {
            output.section(&format!("Last {} interactions", rows.len()));
            let widths = [17, 12, 16, 14, 10];
            output.table_row(&["WHEN", "PACK", "WORKFLOW", "INTENT", "STATUS", "PREVIEW"], &widths);
            for row in &rows {
                print_row(ctx, row, &widths);
            }
        }
    }

    Ok(0)
}

fn print_row(ctx: &Context, row: &Interaction, widths: &[usize]) {
    let dash = |value: &Option<String>| {
        value
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "-".to_string())
    };

    let when = row
        .created_at
        .as_deref()
        .map(|ts| ts.replace('T', " ").chars().take(16).collect::<String>())
        .unwrap_or_else(|| "-".to_string());
    let preview = preview(row.message_preview.as_deref());

    let columns = [
        when,
        dash(&row.pack_id),
        dash(&row.workflow_id),
        dash(&row.intent),
        dash(&row.status),
        preview,
    ];
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    ctx.output.table_row(&columns, widths);
}

fn preview(message: Option<&str>) -> String {
    match message {
        None | Some("") => "-".to_string(),
        Some(text) if text.chars().count() > PREVIEW_WIDTH => {
            format!("{}...", text.chars().take(PREVIEW_WIDTH).collect::<String>())
        }
        Some(text) => text.to_string(),
    }
}
