use clap::Parser;
use olist_ingest::cli::{Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            // The connection has already been released by the time the error gets here
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Olist Ingest - DuckDB loader for the Olist e-commerce dataset");
    println!("=============================================================");
    println!();
    println!("Load the Olist CSV extracts into a DuckDB database, build the calendar");
    println!("and region dimensions, and verify the result.");
    println!();
    println!("USAGE:");
    println!("    olist-ingest <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    ingest        Load the CSV extracts and rebuild the dimension tables");
    println!("    verify        Inspect an ingested database without modifying it");
    println!("    explore       Run canned exploration queries");
    println!("    credentials   Check that Kaggle credentials are configured");
    println!("    help          Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Load data/raw/*.csv into ask_your_data.db:");
    println!("    olist-ingest ingest");
    println!();
    println!("    # Custom paths and calendar range:");
    println!("    olist-ingest ingest --source-dir /data/olist --db-path olist.db \\");
    println!("                        --start-year 2016 --end-year 2020");
    println!();
    println!("    # Check the loaded database:");
    println!("    olist-ingest verify --db-path olist.db");
    println!();
    println!("For detailed help on any command, use:");
    println!("    olist-ingest <COMMAND> --help");
}
