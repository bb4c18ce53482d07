//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tlog_store::ExportQuery;
use tlog_types::LogDate;

use crate::util::parse_minute;

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Format for the export command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    /// Raw file image: header followed by all 1440 records
    Bin,
}

/// Reusable output format arguments
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Omit header row in CSV output (useful for appending)
    #[arg(long)]
    pub no_header: bool,
}

/// Minute range and decimation
#[derive(Debug, Clone, Args)]
pub struct RangeArgs {
    /// First minute, as HH:MM or minute of day
    #[arg(long, value_parser = parse_minute)]
    pub from: Option<u16>,

    /// Last minute, inclusive, as HH:MM or minute of day
    #[arg(long, value_parser = parse_minute)]
    pub to: Option<u16>,

    /// Keep every Nth minute
    #[arg(long, default_value = "1")]
    pub step: u16,
}

impl RangeArgs {
    pub fn query(&self) -> ExportQuery {
        let mut query = ExportQuery::new().step(self.step);
        if let Some(from) = self.from {
            query = query.from_minute(from);
        }
        if let Some(to) = self.to {
            query = query.to_minute(to);
        }
        query
    }
}

#[derive(Parser)]
#[command(name = "tlog")]
#[command(author, version, about = "Inspect and export daily thermostat logs", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory holding log_YYYYMMDD.bin files
    #[arg(short, long, global = true, env = "TLOG_DIR")]
    pub dir: Option<PathBuf>,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List stored days
    List {
        #[command(flatten)]
        format: OutputArgs,
    },

    /// Show samples of a day
    Show {
        /// Day as YYYY-MM-DD or YYYYMMDD (defaults to today)
        date: Option<LogDate>,

        /// Read a single minute straight from the file
        #[arg(short, long, value_parser = parse_minute, conflicts_with_all = ["from", "to"])]
        minute: Option<u16>,

        #[command(flatten)]
        range: RangeArgs,

        /// Include minutes with no reading
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        format: OutputArgs,
    },

    /// Temperature and heater statistics for a day
    Stats {
        /// Day as YYYY-MM-DD or YYYYMMDD (defaults to today)
        date: Option<LogDate>,

        #[command(flatten)]
        format: OutputArgs,
    },

    /// Export a day as JSON, CSV or raw binary
    Export {
        /// Day as YYYY-MM-DD or YYYYMMDD (defaults to today)
        date: Option<LogDate>,

        /// Export format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        #[command(flatten)]
        range: RangeArgs,

        /// Skip minutes with no reading
        #[arg(long)]
        valid_only: bool,
    },

    /// Delete day files older than the retention window
    Cleanup {
        /// Number of days to keep, counting today
        #[arg(short, long, default_value = "30")]
        keep: u16,

        /// Treat this day as today
        #[arg(long)]
        today: Option<LogDate>,
    },

    /// Write a simulated day of samples
    Generate {
        /// Day as YYYY-MM-DD or YYYYMMDD (defaults to today)
        date: Option<LogDate>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Stop after this minute, as HH:MM or minute of day
        #[arg(long, value_parser = parse_minute, default_value = "23:59")]
        until: u16,

        /// Heater hysteresis in °C
        #[arg(long, default_value = "0.3")]
        hysteresis: f32,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
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
    fn test_parse_show_with_range() {
        let cli = Cli::try_parse_from([
            "tlog", "show", "2025-12-21", "--from", "06:00", "--to", "420", "--step", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Show {
                date, range, all, ..
            } => {
                assert_eq!(date, Some(LogDate::new(2025, 12, 21).unwrap()));
                let query = range.query();
                assert_eq!((query.from, query.to, query.step), (360, 420, 5));
                assert!(!all);
            }
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn test_minute_conflicts_with_range() {
        assert!(Cli::try_parse_from(["tlog", "show", "--minute", "10", "--from", "5"]).is_err());
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(Cli::try_parse_from(["tlog", "stats", "2025-02-30"]).is_err());
    }

    #[test]
    fn test_default_range_is_whole_day() {
        let cli = Cli::try_parse_from(["tlog", "export"]).unwrap();
        match cli.command {
            Commands::Export { range, format, .. } => {
                assert_eq!(range.query(), ExportQuery::new());
                assert_eq!(format, ExportFormat::Json);
            }
            _ => panic!("expected export"),
        }
    }
}
