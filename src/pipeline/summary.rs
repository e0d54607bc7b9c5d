//! Post-load catalog summary.

use crate::constants::MANAGED_SCHEMAS;
use crate::db::Database;
use crate::error::Result;
use crate::pipeline::loader::LoadReport;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One table in the managed namespaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub schema: String,
    pub table: String,
    pub column_count: usize,
    pub row_count: u64,
}

/// Everything a successful ingestion run reports
#[derive(Debug, Clone)]
pub struct IngestionSummary {
    pub db_path: PathBuf,
    pub tables: Vec<TableSummary>,
    pub load_report: LoadReport,
    pub calendar_rows: usize,
    pub region_rows: usize,
    pub elapsed: Duration,
}

impl IngestionSummary {
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.row_count).sum()
    }

    /// Tables belonging to one schema
    pub fn tables_in<'a>(&'a self, schema: &'a str) -> impl Iterator<Item = &'a TableSummary> + 'a {
        self.tables.iter().filter(move |t| t.schema == schema)
    }

    pub fn table(&self, schema: &str, table: &str) -> Option<&TableSummary> {
        self.tables
            .iter()
            .find(|t| t.schema == schema && t.table == table)
    }
}

impl fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<12} {:<32} {:>8} {:>12}",
            "schema", "table", "columns", "rows"
        )?;
        for t in &self.tables {
            writeln!(
                f,
                "{:<12} {:<32} {:>8} {:>12}",
                t.schema, t.table, t.column_count, t.row_count
            )?;
        }
        Ok(())
    }
}

/// Column and row counts for every table in the managed namespaces
pub fn collect_table_summaries(db: &Database) -> Result<Vec<TableSummary>> {
    db.list_tables(MANAGED_SCHEMAS)?
        .into_iter()
        .map(|info| {
            let row_count = db.count_rows(&info.table)?;
            Ok(TableSummary {
                schema: info.table.schema,
                table: info.table.table,
                column_count: info.column_count,
                row_count,
            })
        })
        .collect()
}
