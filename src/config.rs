//! Configuration management and validation.
//!
//! Provides the settings for an ingestion run and for a verification pass.
//! Both start from the Olist defaults and are adjusted through `with_*`
//! builders, which is how the CLI layers its arguments on top.

use crate::constants::{
    DEFAULT_CALENDAR_END_YEAR, DEFAULT_CALENDAR_START_YEAR, DEFAULT_DB_PATH, DEFAULT_SAMPLE_ROWS,
    DEFAULT_SOURCE_DIR, MANAGED_SCHEMAS, RAW_SCHEMA, verification,
};
use crate::error::{IngestError, Result};
use crate::manifest::{LoadManifest, TableRef, validate_identifier};
use crate::pipeline::calendar::CalendarRange;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Settings for one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// DuckDB database file, created if absent
    pub db_path: PathBuf,

    /// Directory holding the CSV extracts
    pub source_dir: PathBuf,

    /// Inclusive year bounds for the calendar dimension
    pub calendar: CalendarRange,

    /// Expected extracts and their raw tables
    pub manifest: LoadManifest,

    /// Show a progress bar while loading extracts
    pub show_progress: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            calendar: CalendarRange {
                start_year: DEFAULT_CALENDAR_START_YEAR,
                end_year: DEFAULT_CALENDAR_END_YEAR,
            },
            manifest: LoadManifest::olist(),
            show_progress: true,
        }
    }
}

impl IngestConfig {
    /// Set the database file
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    /// Set the directory the extracts are read from
    pub fn with_source_dir(mut self, source_dir: impl Into<PathBuf>) -> Self {
        self.source_dir = source_dir.into();
        self
    }

    /// Set the calendar year bounds
    pub fn with_calendar_years(mut self, start_year: i32, end_year: i32) -> Self {
        self.calendar = CalendarRange {
            start_year,
            end_year,
        };
        self
    }

    /// Replace the load manifest
    pub fn with_manifest(mut self, manifest: LoadManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Disable the progress bar
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Check the configuration before any connection is opened
    pub fn validate(&self) -> Result<()> {
        self.calendar.validate()?;

        if self.db_path.as_os_str().is_empty() {
            return Err(IngestError::configuration("Database path must not be empty"));
        }

        if self.manifest.is_empty() {
            return Err(IngestError::configuration(
                "Load manifest must list at least one source file",
            ));
        }

        debug!(
            "Configuration valid: {} manifest entries, calendar {}-{}",
            self.manifest.len(),
            self.calendar.start_year,
            self.calendar.end_year
        );
        Ok(())
    }
}

/// Settings for a read-only verification pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Database file to inspect
    pub db_path: PathBuf,

    /// Rows shown per sample query
    pub sample_rows: usize,

    /// Namespaces expected to exist
    pub expected_schemas: Vec<String>,

    /// Primary transactional table
    pub primary: TableRef,

    /// Key column checked for nulls and used for referential completeness
    pub key_column: String,

    /// Timestamp column scanned for its range
    pub timestamp_column: String,

    /// Child table referencing the primary table through `key_column`
    pub child: TableRef,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            sample_rows: DEFAULT_SAMPLE_ROWS,
            expected_schemas: MANAGED_SCHEMAS.iter().map(|s| s.to_string()).collect(),
            primary: TableRef {
                schema: RAW_SCHEMA.to_string(),
                table: verification::PRIMARY_TABLE.to_string(),
            },
            key_column: verification::KEY_COLUMN.to_string(),
            timestamp_column: verification::TIMESTAMP_COLUMN.to_string(),
            child: TableRef {
                schema: RAW_SCHEMA.to_string(),
                table: verification::CHILD_TABLE.to_string(),
            },
        }
    }
}

impl VerifyConfig {
    /// Set the database file
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    /// Set the number of sample rows
    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    /// Point the key checks at a different parent/child pair
    pub fn with_relationship(
        mut self,
        primary: TableRef,
        child: TableRef,
        key_column: impl Into<String>,
    ) -> Self {
        self.primary = primary;
        self.child = child;
        self.key_column = key_column.into();
        self
    }

    /// Set the timestamp column scanned on the primary table
    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = column.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.key_column)?;
        validate_identifier(&self.timestamp_column)?;
        validate_identifier(&self.primary.schema)?;
        validate_identifier(&self.primary.table)?;
        validate_identifier(&self.child.schema)?;
        validate_identifier(&self.child.table)?;
        for schema in &self.expected_schemas {
            validate_identifier(schema)?;
        }
        Ok(())
    }
}
