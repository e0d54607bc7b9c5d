//! Command implementations for the ingestion CLI
//!
//! Maps parsed arguments onto library configuration, sets up logging and
//! prints the human-facing reports for each command.

use crate::cli::{Args, Command, ExploreArgs, IngestArgs, Verbosity, VerifyArgs};
use crate::config::{IngestConfig, VerifyConfig};
use crate::constants::credentials::{CONFIG_DIR, CONFIG_FILE, DATASET, KEY_ENV, USERNAME_ENV};
use crate::credentials::{CredentialSource, check_credentials};
use crate::explore::Explorer;
use crate::pipeline::IngestionPipeline;
use crate::pipeline::summary::IngestionSummary;
use crate::verify::Verifier;
use anyhow::{Context, Result};
use colored::*;
use indicatif::HumanDuration;
use std::io;
use tracing::{debug, info};

/// Dispatch a parsed command line
pub fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Command::Ingest(ingest)) => run_ingest(ingest).map(|_| ()),
        Some(Command::Verify(verify)) => run_verify(verify),
        Some(Command::Explore(explore)) => run_explore(explore),
        Some(Command::Credentials) => run_credentials(),
        None => Ok(()),
    }
}

/// Set up structured logging based on verbosity flags
pub fn setup_logging(verbosity: &Verbosity) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = verbosity.get_log_level();

    // RUST_LOG takes priority over the flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("olist_ingest={}", log_level)));

    let result = if verbosity.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Run the ingestion pipeline and print its summary
pub fn run_ingest(args: IngestArgs) -> Result<IngestionSummary> {
    setup_logging(&args.verbosity);
    debug!("Command line arguments: {:?}", args);

    let mut config = IngestConfig::default()
        .with_db_path(&args.db_path)
        .with_source_dir(&args.source_dir)
        .with_calendar_years(args.start_year, args.end_year);
    if !args.verbosity.show_progress() {
        config = config.without_progress();
    }

    let mut pipeline = IngestionPipeline::new(config);
    let summary = match pipeline.run() {
        Ok(summary) => summary,
        Err(error) => {
            println!(
                "\n{} {}",
                "✗ Error during ingestion:".bright_red().bold(),
                error
            );
            return Err(error).context("Ingestion failed");
        }
    };
    info!("Pipeline finished in state {:?}", pipeline.state());

    print_ingestion_report(&summary);
    Ok(summary)
}

fn print_ingestion_report(summary: &IngestionSummary) {
    println!("\n{}", "Database Summary".bright_green().bold());
    println!("{}", "=".repeat(70));
    print!("{summary}");
    println!("{}", "=".repeat(70));

    let location = std::fs::canonicalize(&summary.db_path).unwrap_or_else(|_| summary.db_path.clone());
    println!(
        "{}",
        "Data ingestion completed successfully!".bright_green().bold()
    );
    println!("  {} {}", "Database location:".bright_cyan(), location.display());
    println!(
        "  {} {}",
        "Total tables:".bright_cyan(),
        summary.tables.len().to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Total rows:".bright_cyan(),
        summary.total_rows().to_string().bright_white().bold()
    );
    if !summary.load_report.skipped.is_empty() {
        println!(
            "  {} {}",
            "Skipped sources:".bright_yellow(),
            summary.load_report.skipped.len()
        );
    }
    println!(
        "  {} {}",
        "Elapsed:".bright_cyan(),
        HumanDuration(summary.elapsed)
    );
}

/// Verify an ingested database; warnings are reported, never raised
pub fn run_verify(args: VerifyArgs) -> Result<()> {
    setup_logging(&args.verbosity);

    let config = VerifyConfig::default()
        .with_db_path(&args.db_path)
        .with_sample_rows(args.sample_rows);

    println!("{}", "Data Verification".bright_green().bold());
    println!("{}", "=".repeat(70));

    let report = Verifier::new(config)
        .run()
        .with_context(|| format!("Could not verify {}", args.db_path.display()))?;
    print!("{report}");

    println!("{}", "=".repeat(70));
    let warnings = report.warnings().count();
    if warnings == 0 {
        println!("{}", "All verification checks passed!".bright_green().bold());
    } else {
        println!(
            "{}",
            format!("Verification finished with {warnings} warning(s)")
                .bright_yellow()
                .bold()
        );
    }
    Ok(())
}

/// Run one exploration query or the interactive menu
pub fn run_explore(args: ExploreArgs) -> Result<()> {
    setup_logging(&args.verbosity);

    let explorer = Explorer::open(&args.db_path)
        .with_context(|| format!("Could not open {}", args.db_path.display()))?;

    match args.query {
        Some(choice) => {
            let table = explorer.run_query(choice)?;
            print!("{table}");
        }
        None => {
            println!("{}", "DuckDB Database Explorer".bright_green().bold());
            explorer.interactive(io::stdin().lock(), io::stdout().lock())?;
        }
    }

    explorer.close()?;
    Ok(())
}

/// Report whether Kaggle credentials are available
pub fn run_credentials() -> Result<()> {
    setup_logging(&Verbosity::default());

    match check_credentials() {
        CredentialSource::Environment => {
            println!(
                "{} Using {} and {} from the environment",
                "✓".bright_green(),
                USERNAME_ENV,
                KEY_ENV
            );
        }
        CredentialSource::File(path) => {
            println!("{} Using credentials file {}", "✓".bright_green(), path.display());
        }
        CredentialSource::Missing => {
            println!("{}", "✗ Kaggle credentials not found!".bright_red().bold());
            println!("\nPlease configure Kaggle API credentials:");
            println!("1. Go to https://www.kaggle.com/account");
            println!("2. Click 'Create New API Token'");
            println!("3. Place {} in: ~/{}", CONFIG_FILE, CONFIG_DIR);
            println!("\nOr set environment variables:");
            println!("   export {}=your_username", USERNAME_ENV);
            println!("   export {}=your_api_key", KEY_ENV);
            anyhow::bail!("No credentials available to download {}", DATASET);
        }
    }

    println!(
        "Download the dataset with: kaggle datasets download -d {} --unzip",
        DATASET
    );
    Ok(())
}
