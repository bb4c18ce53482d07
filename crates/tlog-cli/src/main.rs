//! `tlog`: inspect, export and maintain daily thermostat log files.

mod cli;
mod commands;
mod format;
mod util;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{ExportArgs, GenerateArgs, ShowArgs};
use format::FormatOptions;
use util::{date_or_today, log_dir};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "tlog", &mut io::stdout());
        return Ok(());
    }

    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let dir = log_dir(cli.dir.as_deref());
    tracing::debug!("Using log directory {}", dir.root().display());
    let output = cli.output.as_ref();

    match cli.command {
        Commands::List { format } => {
            let opts = FormatOptions::new(format.no_header, cli.compact);
            commands::cmd_list(&dir, format.format, output, &opts)
        }
        Commands::Show {
            date,
            minute,
            range,
            all,
            format,
        } => {
            let mut query = range.query();
            if !all {
                query = query.valid_only();
            }
            let opts = FormatOptions::new(format.no_header, cli.compact);
            commands::cmd_show(
                &dir,
                ShowArgs {
                    date: date_or_today(date)?,
                    minute,
                    query,
                    format: format.format,
                    output,
                    opts: &opts,
                },
            )
        }
        Commands::Stats { date, format } => {
            let opts = FormatOptions::new(format.no_header, cli.compact);
            commands::cmd_stats(&dir, date_or_today(date)?, format.format, output, &opts)
        }
        Commands::Export {
            date,
            format,
            range,
            valid_only,
        } => {
            let mut query = range.query();
            if valid_only {
                query = query.valid_only();
            }
            commands::cmd_export(
                &dir,
                ExportArgs {
                    date: date_or_today(date)?,
                    format,
                    query,
                    output,
                },
            )
        }
        Commands::Cleanup { keep, today } => {
            commands::cmd_cleanup(&dir, keep, date_or_today(today)?, cli.quiet)
        }
        Commands::Generate {
            date,
            seed,
            until,
            hysteresis,
            force,
        } => commands::cmd_generate(
            &dir,
            GenerateArgs {
                date: date_or_today(date)?,
                seed,
                until,
                hysteresis,
                force,
                quiet: cli.quiet,
            },
        ),
        Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    }
}
