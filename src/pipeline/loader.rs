//! CSV extract loading.
//!
//! Each manifest entry becomes one table in the raw schema, materialised by
//! DuckDB's `read_csv_auto` with type inference. A reload drops and recreates
//! the table inside a single transaction, so a failed reload rolls back to the
//! previous version instead of leaving a half-written table.

use crate::constants::{CSV_NULL_STRING, CSV_TIMESTAMP_FORMAT, RAW_SCHEMA};
use crate::db::Database;
use crate::error::{IngestError, Result};
use crate::manifest::{LoadManifest, ManifestEntry, TableRef, quote_literal};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Row count for one loaded extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTable {
    pub table: String,
    pub source: PathBuf,
    pub row_count: u64,
}

/// Manifest entry whose source file was not found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub table: String,
    pub expected_path: PathBuf,
}

/// Outcome of loading a manifest, in manifest order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<LoadedTable>,
    pub skipped: Vec<SkippedSource>,
}

impl LoadReport {
    /// Row count for a loaded table, if it was loaded
    pub fn row_count(&self, table: &str) -> Option<u64> {
        self.loaded
            .iter()
            .find(|loaded| loaded.table == table)
            .map(|loaded| loaded.row_count)
    }

    pub fn total_rows(&self) -> u64 {
        self.loaded.iter().map(|loaded| loaded.row_count).sum()
    }
}

/// Loads the manifest's extracts from one source directory
#[derive(Debug)]
pub struct CsvLoader {
    source_dir: PathBuf,
    manifest: LoadManifest,
    show_progress: bool,
}

impl CsvLoader {
    pub fn new(source_dir: impl Into<PathBuf>, manifest: LoadManifest) -> Self {
        Self {
            source_dir: source_dir.into(),
            manifest,
            show_progress: false,
        }
    }

    /// Show a progress bar while loading
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Load every present extract, skipping missing ones
    ///
    /// Stops at the first table that fails to load; tables loaded before it
    /// stay committed.
    pub fn load(&self, db: &mut Database) -> Result<LoadReport> {
        if !self.source_dir.is_dir() {
            return Err(IngestError::MissingDirectory {
                path: self.source_dir.clone(),
            });
        }

        let progress = self.progress_bar();
        let mut report = LoadReport::default();

        for entry in self.manifest.entries() {
            progress.set_message(entry.table.clone());
            let source = self.source_dir.join(&entry.file_name);

            if !source.is_file() {
                warn!("{} not found, skipping raw.{}", entry.file_name, entry.table);
                report.skipped.push(SkippedSource {
                    table: entry.table.clone(),
                    expected_path: source,
                });
                progress.inc(1);
                continue;
            }

            let row_count = match load_table(db, entry, &source) {
                Ok(count) => count,
                Err(error) => {
                    progress.abandon_with_message(format!("failed on {}", entry.table));
                    return Err(error);
                }
            };
            info!("Loaded {:<35} {:>10} rows", entry.table, row_count);

            report.loaded.push(LoadedTable {
                table: entry.table.clone(),
                source,
                row_count,
            });
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(report)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(self.manifest.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    }
}

/// The `read_csv_auto` call for one source file
fn read_csv_sql(source: &Path) -> String {
    format!(
        "read_csv_auto({}, header = true, nullstr = {}, timestampformat = {})",
        quote_literal(&source.to_string_lossy()),
        quote_literal(CSV_NULL_STRING),
        quote_literal(CSV_TIMESTAMP_FORMAT),
    )
}

/// Drop and recreate one raw table from its source file
fn load_table(db: &mut Database, entry: &ManifestEntry, source: &Path) -> Result<u64> {
    let table = TableRef::new(RAW_SCHEMA, entry.table.as_str())?;
    let load_failed = |source_err| IngestError::LoadFailed {
        table: entry.table.clone(),
        path: source.to_path_buf(),
        source: source_err,
    };

    let sql = format!(
        "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} AS SELECT * FROM {reader};",
        table = table.qualified(),
        reader = read_csv_sql(source),
    );
    debug!("{}", sql);

    let tx = db.connection_mut().transaction().map_err(load_failed)?;
    tx.execute_batch(&sql).map_err(load_failed)?;
    let count: i64 = tx
        .query_row(&format!("SELECT COUNT(*) FROM {}", table.qualified()), [], |row| {
            row.get(0)
        })
        .map_err(load_failed)?;
    tx.commit().map_err(load_failed)?;

    Ok(u64::try_from(count).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_sql_escapes_path() {
        let sql = read_csv_sql(Path::new("/data/o'brien.csv"));
        assert!(sql.starts_with("read_csv_auto('/data/o''brien.csv'"));
        assert!(sql.contains("nullstr = ''"));
        assert!(sql.contains("timestampformat = '%Y-%m-%d %H:%M:%S'"));
    }

    #[test]
    fn test_report_lookups() {
        let report = LoadReport {
            loaded: vec![
                LoadedTable {
                    table: "orders".into(),
                    source: PathBuf::from("orders.csv"),
                    row_count: 10,
                },
                LoadedTable {
                    table: "sellers".into(),
                    source: PathBuf::from("sellers.csv"),
                    row_count: 5,
                },
            ],
            skipped: vec![],
        };
        assert_eq!(report.row_count("orders"), Some(10));
        assert_eq!(report.row_count("customers"), None);
        assert_eq!(report.total_rows(), 15);
    }
}
