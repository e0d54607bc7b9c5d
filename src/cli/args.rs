//! Command line argument definitions.

use crate::constants::{
    DEFAULT_CALENDAR_END_YEAR, DEFAULT_CALENDAR_START_YEAR, DEFAULT_DB_PATH, DEFAULT_SAMPLE_ROWS,
    DEFAULT_SOURCE_DIR,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "olist-ingest")]
#[command(about = "Load the Olist e-commerce CSV extracts into DuckDB")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the CSV extracts and rebuild the dimension tables
    Ingest(IngestArgs),
    /// Inspect an ingested database without modifying it
    Verify(VerifyArgs),
    /// Run canned exploration queries
    Explore(ExploreArgs),
    /// Check that dataset provider credentials are configured
    Credentials,
}

/// Verbosity flags shared by every command
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct Verbosity {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and hide progress bars
    #[arg(short, long)]
    pub quiet: bool,
}

impl Verbosity {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

#[derive(ClapArgs, Debug)]
pub struct IngestArgs {
    /// DuckDB database file to create or update
    #[arg(long, env = "OLIST_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Directory containing the Olist CSV extracts
    #[arg(long, env = "OLIST_DATA_DIR", default_value = DEFAULT_SOURCE_DIR)]
    pub source_dir: PathBuf,

    /// First calendar year (inclusive)
    #[arg(long, default_value_t = DEFAULT_CALENDAR_START_YEAR)]
    pub start_year: i32,

    /// Last calendar year (inclusive)
    #[arg(long, default_value_t = DEFAULT_CALENDAR_END_YEAR)]
    pub end_year: i32,

    #[command(flatten)]
    pub verbosity: Verbosity,
}

#[derive(ClapArgs, Debug)]
pub struct VerifyArgs {
    /// DuckDB database file to inspect
    #[arg(long, env = "OLIST_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Rows shown for the primary table sample
    #[arg(long, default_value_t = DEFAULT_SAMPLE_ROWS)]
    pub sample_rows: usize,

    #[command(flatten)]
    pub verbosity: Verbosity,
}

#[derive(ClapArgs, Debug)]
pub struct ExploreArgs {
    /// DuckDB database file to query
    #[arg(long, env = "OLIST_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Run a single menu query by number instead of prompting
    #[arg(long)]
    pub query: Option<usize>,

    #[command(flatten)]
    pub verbosity: Verbosity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_defaults() {
        let args = Args::try_parse_from(["olist-ingest", "ingest"]).unwrap();
        match args.command {
            Some(Command::Ingest(ingest)) => {
                assert_eq!(ingest.start_year, 2016);
                assert_eq!(ingest.end_year, 2025);
                assert_eq!(ingest.verbosity.get_log_level(), "warn");
                assert!(ingest.verbosity.show_progress());
            }
            other => panic!("Expected ingest command, got {other:?}"),
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = Args::try_parse_from(["olist-ingest", "verify", "-vv"]).unwrap();
        match args.command {
            Some(Command::Verify(verify)) => {
                assert_eq!(verify.verbosity.get_log_level(), "debug");
                assert_eq!(verify.sample_rows, 3);
            }
            other => panic!("Expected verify command, got {other:?}"),
        }

        let args = Args::try_parse_from(["olist-ingest", "ingest", "--quiet"]).unwrap();
        match args.command {
            Some(Command::Ingest(ingest)) => {
                assert_eq!(ingest.verbosity.get_log_level(), "error");
                assert!(!ingest.verbosity.show_progress());
            }
            other => panic!("Expected ingest command, got {other:?}"),
        }
    }

    #[test]
    fn test_no_subcommand() {
        let args = Args::try_parse_from(["olist-ingest"]).unwrap();
        assert!(args.command.is_none());
    }
}
