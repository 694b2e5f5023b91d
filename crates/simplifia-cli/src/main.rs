mod config;
mod context;
mod install;
mod list;
mod logs;
mod status;
mod uninstall;
mod update;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use context::Context;

#[derive(Parser, Debug)]
#[command(name = "simplifia")]
#[command(version, about = "Install and manage SimplifIA packs")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Hide progress spinners and bars
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download and install a pack
    Install(install::InstallArgs),

    /// Update one installed pack, or all of them
    Update(update::UpdateArgs),

    /// Remove an installed pack
    Uninstall(uninstall::UninstallArgs),

    /// Show installed packs
    Status(status::StatusArgs),

    /// List packs available in the registry
    List(list::ListArgs),

    /// Show recent workflow interactions
    Logs(logs::LogsArgs),

    /// Show resolved configuration and where each value came from
    Config(config::ConfigArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Context::load(cli.quiet, cli.verbose, !cli.no_progress)?;

    match cli.command {
        Commands::Install(args) => install::execute(args, &ctx),
        Commands::Update(args) => update::execute(args, &ctx),
        Commands::Uninstall(args) => uninstall::execute(args, &ctx),
        Commands::Status(args) => status::execute(args, &ctx),
        Commands::List(args) => list::execute(args, &ctx),
        Commands::Logs(args) => logs::execute(args, &ctx),
        Commands::Config(args) => config::execute(args, &ctx),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(e) => {
            eprintln!("{} {}", console::style("Error:").red().bold(), e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install_force() {
        let cli = Cli::try_parse_from(["simplifia", "install", "whatsapp", "--force"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.pack_id, "whatsapp");
                assert!(args.force);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verbose_count() {
        let cli = Cli::try_parse_from(["simplifia", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_update_requires_target_or_all() {
        assert!(Cli::try_parse_from(["simplifia", "update"]).is_err());
        assert!(Cli::try_parse_from(["simplifia", "update", "crm", "--all"]).is_err());
        assert!(Cli::try_parse_from(["simplifia", "update", "--all"]).is_ok());
    }

    #[test]
    fn test_uninstall_data_flags_conflict() {
        assert!(Cli::try_parse_from(["simplifia", "uninstall", "crm", "--keep-data", "--purge-data"]).is_err());
        assert!(Cli::try_parse_from(["simplifia", "uninstall", "crm", "--purge-data", "-y"]).is_ok());
    }

    #[test]
    fn test_logs_defaults() {
        let cli = Cli::try_parse_from(["simplifia", "logs"]).unwrap();
        match cli.command {
            Commands::Logs(args) => {
                assert!(args.pack_id.is_none());
                assert_eq!(args.lines, 20);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
