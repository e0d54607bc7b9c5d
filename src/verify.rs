//! Post-load verification.
//!
//! The verifier opens the database read-only and runs a fixed sequence of
//! observational checks. A check that finds a problem, or cannot run at all,
//! is recorded as a warning and the sequence carries on. Only failing to open
//! the database is an error.

use crate::config::VerifyConfig;
use crate::constants::{CALENDAR_TABLE, DIMENSIONS_SCHEMA, REGION_LOOKUP_TABLE, verification};
use crate::db::{Database, QueryTable};
use crate::error::Result;
use crate::manifest::{TableRef, quote_literal};
use colored::*;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Info,
    Warn,
}

impl CheckStatus {
    fn marker(&self) -> ColoredString {
        match self {
            CheckStatus::Pass => "✓".bright_green(),
            CheckStatus::Info => "ℹ".bright_cyan(),
            CheckStatus::Warn => "⚠".bright_yellow(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckOutcome {
    fn new(name: impl Into<String>, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
        }
    }

    fn could_not_run(name: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::new(name, CheckStatus::Warn, format!("could not run: {error}"))
    }
}

/// Distinct key counts in a parent table and a child table that references it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferentialCompleteness {
    pub parent_keys: u64,
    pub child_keys: u64,
}

impl ReferentialCompleteness {
    /// Child keys as a percentage of parent keys; `None` when the parent is empty
    pub fn ratio_percent(&self) -> Option<f64> {
        if self.parent_keys == 0 {
            None
        } else {
            Some(self.child_keys as f64 / self.parent_keys as f64 * 100.0)
        }
    }

    /// 100% passes, anything lower is informational, above 100% or no parent keys warns
    pub fn status(&self) -> CheckStatus {
        match self.ratio_percent() {
            None => CheckStatus::Warn,
            Some(_) if self.child_keys == self.parent_keys => CheckStatus::Pass,
            Some(_) if self.child_keys < self.parent_keys => CheckStatus::Info,
            Some(_) => CheckStatus::Warn,
        }
    }
}

/// Size and location of the database file
#[derive(Debug, Clone, PartialEq)]
pub struct StorageInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl StorageInfo {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Everything a verification pass observed
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub checks: Vec<CheckOutcome>,
    pub row_counts: Vec<(TableRef, u64)>,
    pub samples: Vec<(String, QueryTable)>,
    pub completeness: Option<ReferentialCompleteness>,
    pub storage: Option<StorageInfo>,
}

impl VerificationReport {
    pub fn warnings(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks
            .iter()
            .filter(|check| check.status == CheckStatus::Warn)
    }

    pub fn all_passed(&self) -> bool {
        self.warnings().next().is_none()
    }

    pub fn check(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|check| check.name == name)
    }

    pub fn row_count(&self, table: &TableRef) -> Option<u64> {
        self.row_counts
            .iter()
            .find(|(t, _)| t == table)
            .map(|(_, count)| *count)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "Table row counts".bright_white().bold())?;
        for (table, count) in &self.row_counts {
            writeln!(f, "   {:<45} {:>10} rows", table.to_string(), count)?;
        }

        for (title, sample) in &self.samples {
            writeln!(f, "\n   {}", title.bright_cyan())?;
            for line in sample.to_string().lines() {
                writeln!(f, "   {line}")?;
            }
        }

        writeln!(f, "\n{}", "Checks".bright_white().bold())?;
        for check in &self.checks {
            writeln!(
                f,
                "   {} {:<28} {}",
                check.status.marker(),
                check.name,
                check.detail
            )?;
        }

        if let Some(storage) = &self.storage {
            writeln!(f, "\n{}", "Storage".bright_white().bold())?;
            writeln!(f, "   Database file size: {:.2} MB", storage.size_mb())?;
            writeln!(f, "   Location: {}", storage.path.display())?;
        }
        Ok(())
    }
}

/// Read-only, advisory verification of an ingested database
#[derive(Debug)]
pub struct Verifier {
    config: VerifyConfig,
}

impl Verifier {
    pub fn new(config: VerifyConfig) -> Self {
        Self { config }
    }

    /// Run every check in order
    pub fn run(&self) -> Result<VerificationReport> {
        self.config.validate()?;

        info!("Verifying {}", self.config.db_path.display());
        let db = Database::open_read_only(&self.config.db_path)?;
        let mut report = VerificationReport::default();

        self.check_schemas(&db, &mut report);
        self.collect_row_counts(&db, &mut report);
        self.collect_samples(&db, &mut report);
        self.check_null_keys(&db, &mut report);
        self.check_timestamp_range(&db, &mut report);
        self.check_completeness(&db, &mut report);
        report.storage = self.storage_info();

        if let Err(error) = db.close() {
            debug!("Closing read-only connection failed: {}", error);
        }
        Ok(report)
    }

    fn check_schemas(&self, db: &Database, report: &mut VerificationReport) {
        for schema in &self.config.expected_schemas {
            let name = format!("schema {schema}");
            let outcome = match db.schema_exists(schema) {
                Ok(true) => CheckOutcome::new(name, CheckStatus::Pass, "exists"),
                Ok(false) => CheckOutcome::new(name, CheckStatus::Warn, "missing"),
                Err(error) => CheckOutcome::could_not_run(name, error),
            };
            report.checks.push(outcome);
        }
    }

    fn collect_row_counts(&self, db: &Database, report: &mut VerificationReport) {
        let schemas: Vec<&str> = self
            .config
            .expected_schemas
            .iter()
            .map(String::as_str)
            .collect();

        let tables = match db.list_tables(&schemas) {
            Ok(tables) => tables,
            Err(error) => {
                report
                    .checks
                    .push(CheckOutcome::could_not_run("table listing", error));
                return;
            }
        };

        for info in tables {
            match db.count_rows(&info.table) {
                Ok(count) => report.row_counts.push((info.table, count)),
                Err(error) => report.checks.push(CheckOutcome::could_not_run(
                    format!("row count {}", info.table),
                    error,
                )),
            }
        }
    }

    fn collect_samples(&self, db: &Database, report: &mut VerificationReport) {
        let primary = &self.config.primary;
        let calendar = TableRef {
            schema: DIMENSIONS_SCHEMA.to_string(),
            table: CALENDAR_TABLE.to_string(),
        };
        let regions = TableRef {
            schema: DIMENSIONS_SCHEMA.to_string(),
            table: REGION_LOOKUP_TABLE.to_string(),
        };
        let sample_dates = verification::CALENDAR_SAMPLE_DATES
            .iter()
            .map(|date| format!("DATE {}", quote_literal(date)))
            .collect::<Vec<_>>()
            .join(", ");

        let queries = [
            (
                format!("{primary} (first {} rows)", self.config.sample_rows),
                format!(
                    "SELECT * FROM {} LIMIT {}",
                    primary.qualified(),
                    self.config.sample_rows
                ),
            ),
            (
                format!("{calendar} (sample dates)"),
                format!(
                    "SELECT date, year, month, month_name, day_name, is_weekend FROM {} \
                     WHERE date IN ({sample_dates}) ORDER BY date",
                    calendar.qualified()
                ),
            ),
            (
                format!("{regions} (first {})", verification::REGION_SAMPLE_ROWS),
                format!(
                    "SELECT state_code, state_name, region, country FROM {} LIMIT {}",
                    regions.qualified(),
                    verification::REGION_SAMPLE_ROWS
                ),
            ),
        ];

        for (title, sql) in queries {
            match db.query_table(&sql) {
                Ok(table) => report.samples.push((title, table)),
                Err(error) => report
                    .checks
                    .push(CheckOutcome::could_not_run(format!("sample {title}"), error)),
            }
        }
    }

    fn check_null_keys(&self, db: &Database, report: &mut VerificationReport) {
        let name = format!(
            "null {}.{}",
            self.config.primary.table, self.config.key_column
        );
        let outcome = match db.count_nulls(&self.config.primary, &self.config.key_column) {
            Ok(0) => CheckOutcome::new(name, CheckStatus::Pass, "0 rows with NULL key"),
            Ok(nulls) => {
                CheckOutcome::new(name, CheckStatus::Warn, format!("{nulls} rows with NULL key"))
            }
            Err(error) => CheckOutcome::could_not_run(name, error),
        };
        report.checks.push(outcome);
    }

    fn check_timestamp_range(&self, db: &Database, report: &mut VerificationReport) {
        let name = format!(
            "range {}.{}",
            self.config.primary.table, self.config.timestamp_column
        );
        let outcome = match db.min_max(&self.config.primary, &self.config.timestamp_column) {
            Ok((Some(earliest), Some(latest))) => {
                CheckOutcome::new(name, CheckStatus::Pass, format!("{earliest} to {latest}"))
            }
            Ok(_) => CheckOutcome::new(name, CheckStatus::Warn, "no timestamps found"),
            Err(error) => CheckOutcome::could_not_run(name, error),
        };
        report.checks.push(outcome);
    }

    fn check_completeness(&self, db: &Database, report: &mut VerificationReport) {
        let key = &self.config.key_column;
        let name = format!(
            "{} with {}",
            self.config.primary.table, self.config.child.table
        );

        let counts = db
            .count_distinct(&self.config.primary, key)
            .and_then(|parent_keys| {
                db.count_distinct(&self.config.child, key)
                    .map(|child_keys| ReferentialCompleteness {
                        parent_keys,
                        child_keys,
                    })
            });

        let outcome = match counts {
            Ok(completeness) => {
                report.completeness = Some(completeness);
                let detail = match completeness.ratio_percent() {
                    Some(ratio) => format!(
                        "{:.1}% ({} of {} distinct {key})",
                        ratio, completeness.child_keys, completeness.parent_keys,
                    ),
                    None => format!("no distinct {key} in parent table"),
                };
                CheckOutcome::new(name, completeness.status(), detail)
            }
            Err(error) => CheckOutcome::could_not_run(name, error),
        };
        report.checks.push(outcome);
    }

    fn storage_info(&self) -> Option<StorageInfo> {
        let metadata = std::fs::metadata(&self.config.db_path).ok()?;
        let path = std::fs::canonicalize(&self.config.db_path)
            .unwrap_or_else(|_| self.config.db_path.clone());
        Some(StorageInfo {
            path,
            size_bytes: metadata.len(),
        })
    }
}
