//! Config command - show resolved settings and their sources.

use anyhow::Result;
use clap::Args;

use crate::context::Context;

#[derive(Args, Debug)]
pub struct ConfigArgs {}

pub fn execute(_args: ConfigArgs, ctx: &Context) -> Result<i32> {
    let settings = &ctx.settings;
    let output = &ctx.output;

    let limit = settings
        .max_download_bytes
        .map(simplifia_pm::cli::format_bytes)
        .unwrap_or_else(|| "unlimited".to_string());
    let staging = settings
        .staging_dir
        .as_ref()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "(system temp)".to_string());

    let rows = [
        ("root", settings.root_dir.display().to_string()),
        ("registry-url", settings.registry_url.clone()),
        ("registry-timeout", format!("{}s", settings.registry_timeout.as_secs())),
        ("download-timeout", format!("{}s", settings.download_timeout.as_secs())),
        ("staging-dir", staging),
        ("max-download-bytes", limit),
        ("proxy", settings.proxy.clone().unwrap_or_else(|| "-".to_string())),
        (
            "cafile",
            settings
                .cafile
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];

    output.section("Configuration");
    let widths = [20, 60];
    for (key, value) in &rows {
        let source = settings.source_of(key);
        let described = format!("{} ({})", value, source.as_str());
        output.table_row(&[*key, described.as_str()], &widths);
    }

    output.hint(&format!("Config file: {}", settings.config_path().display()));
    output.hint(&format!("Ledger: {}", settings.ledger_path().display()));
    Ok(0)
}
