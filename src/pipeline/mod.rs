//! Ingestion pipeline.
//!
//! Orchestrates a complete run: provision the schemas, load the raw
//! extracts, rebuild the calendar and region dimensions, then summarise the
//! catalog. The pipeline owns the database connection for the whole run and
//! hands it to each step explicitly.

pub mod calendar;
pub mod loader;
pub mod regions;
pub mod schema;
pub mod summary;

#[cfg(test)]
pub mod tests;

use self::{
    calendar::build_calendar,
    loader::{CsvLoader, LoadReport},
    regions::build_region_lookup,
    schema::provision_schemas,
    summary::{IngestionSummary, collect_table_summaries},
};

use crate::config::IngestConfig;
use crate::db::Database;
use crate::error::Result;

use colored::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Disconnected,
    SchemaReady,
    RawLoaded,
    DimensionsBuilt,
    Summarized,
    Closed,
    Failed,
}

/// Row counts produced by the dimension step
#[derive(Debug, Clone, Copy)]
struct DimensionCounts {
    calendar_rows: usize,
    region_rows: usize,
}

/// Runs the ingestion steps in order against one database file
#[derive(Debug)]
pub struct IngestionPipeline {
    config: IngestConfig,
    state: PipelineState,
}

impl IngestionPipeline {
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            state: PipelineState::Disconnected,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Execute the full pipeline
    ///
    /// The connection is released before this returns, whether the run
    /// succeeded or failed. A step error takes precedence over a close error.
    pub fn run(&mut self) -> Result<IngestionSummary> {
        let start_time = Instant::now();

        if let Err(error) = self.config.validate() {
            self.transition(PipelineState::Failed);
            return Err(error);
        }

        info!("Opening database {}", self.config.db_path.display());
        let mut db = match Database::open(&self.config.db_path) {
            Ok(db) => db,
            Err(error) => {
                self.transition(PipelineState::Failed);
                return Err(error);
            }
        };

        let outcome = self.run_steps(&mut db, start_time);
        let closed = db.close();

        match (outcome, closed) {
            (Ok(summary), Ok(())) => {
                self.transition(PipelineState::Closed);
                Ok(summary)
            }
            (Ok(_), Err(close_error)) => {
                self.transition(PipelineState::Failed);
                Err(close_error)
            }
            (Err(error), closed) => {
                if let Err(close_error) = closed {
                    warn!("Failed to close database after error: {}", close_error);
                }
                self.transition(PipelineState::Failed);
                Err(error)
            }
        }
    }

    fn run_steps(&mut self, db: &mut Database, start_time: Instant) -> Result<IngestionSummary> {
        println!(
            "{}",
            "Starting Olist dataset ingestion".bright_green().bold()
        );
        println!(
            "  {} {}",
            "Database:".bright_cyan(),
            self.config.db_path.display()
        );
        println!(
            "  {} {}",
            "Source:".bright_cyan(),
            self.config.source_dir.display()
        );

        // Step 1: Namespaces
        provision_schemas(db)?;
        self.transition(PipelineState::SchemaReady);

        // Step 2: Raw extracts
        println!("\n{}", "Loading CSV files into raw schema...".bright_yellow());
        let load_report = self.load_raw(db)?;
        self.transition(PipelineState::RawLoaded);

        // Step 3: Dimensions
        println!("\n{}", "Creating dimension tables...".bright_yellow());
        let dimensions = self.build_dimensions(db)?;
        self.transition(PipelineState::DimensionsBuilt);

        // Step 4: Summary
        let tables = collect_table_summaries(db)?;
        self.transition(PipelineState::Summarized);

        Ok(IngestionSummary {
            db_path: self.config.db_path.clone(),
            tables,
            load_report,
            calendar_rows: dimensions.calendar_rows,
            region_rows: dimensions.region_rows,
            elapsed: start_time.elapsed(),
        })
    }

    fn load_raw(&self, db: &mut Database) -> Result<LoadReport> {
        let loader = CsvLoader::new(&self.config.source_dir, self.config.manifest.clone())
            .with_progress(self.config.show_progress);
        let report = loader.load(db)?;

        for loaded in &report.loaded {
            println!(
                "  {} {:<35} {:>10} rows",
                "✓".bright_green(),
                loaded.table,
                loaded.row_count
            );
        }
        for skipped in &report.skipped {
            println!(
                "  {} {:<35} {}",
                "⚠".bright_yellow(),
                skipped.table,
                "source file not found, skipped".bright_black()
            );
        }
        println!(
            "  {} rows loaded from {} of {} extracts",
            report.total_rows(),
            report.loaded.len(),
            self.config.manifest.len()
        );
        Ok(report)
    }

    fn build_dimensions(&self, db: &mut Database) -> Result<DimensionCounts> {
        let calendar_rows = build_calendar(db, self.config.calendar)?;
        println!(
            "  {} {:<35} {:>10} rows ({}-{})",
            "✓".bright_green(),
            "calendar",
            calendar_rows,
            self.config.calendar.start_year,
            self.config.calendar.end_year
        );

        let region_rows = build_region_lookup(db)?;
        println!(
            "  {} {:<35} {:>10} rows",
            "✓".bright_green(),
            "region_lookup",
            region_rows
        );

        Ok(DimensionCounts {
            calendar_rows,
            region_rows,
        })
    }
}
