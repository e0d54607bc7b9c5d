//! Scoped DuckDB connection handling.
//!
//! A [`Database`] owns the single connection used by a run. Components borrow
//! it explicitly; nothing holds a global handle. Dropping the value releases
//! the connection, and [`Database::close`] does the same while surfacing any
//! error from the close itself.

use crate::error::{IngestError, Result};
use crate::manifest::{TableRef, quote_ident};
use duckdb::{AccessMode, Config, Connection, params_from_iter};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Catalog entry for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub table: TableRef,
    pub column_count: usize,
}

/// Owned handle on the pipeline's DuckDB connection
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .finish()
    }
}

impl Database {
    /// Open (or create) a database file for writing
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| IngestError::ConnectionFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Opened {} read-write", path.display());

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an existing database file without write access
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let connection_failed = |source| IngestError::ConnectionFailed {
            path: path.to_path_buf(),
            source,
        };
        let config = Config::default()
            .access_mode(AccessMode::ReadOnly)
            .map_err(connection_failed)?;
        let conn = Connection::open_with_flags(path, config).map_err(connection_failed)?;
        debug!("Opened {} read-only", path.display());

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            path: None,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Release the connection, reporting any error raised while closing
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_conn, source)| source)?;
        if let Some(path) = path {
            debug!("Closed {}", path.display());
        }
        Ok(())
    }

    /// Whether a schema exists in the catalog
    pub fn schema_exists(&self, schema: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.schemata WHERE schema_name = ?",
            [schema],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Whether a table exists in the catalog
    pub fn table_exists(&self, table: &TableRef) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = ? AND table_name = ?",
            [table.schema.as_str(), table.table.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Every table in the given schemas with its column count, ordered by schema then name
    pub fn list_tables(&self, schemas: &[&str]) -> Result<Vec<TableInfo>> {
        if schemas.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; schemas.len()].join(", ");
        let sql = format!(
            "SELECT t.table_schema, t.table_name, COUNT(c.column_name) \
             FROM information_schema.tables t \
             LEFT JOIN information_schema.columns c \
               ON c.table_schema = t.table_schema AND c.table_name = t.table_name \
             WHERE t.table_schema IN ({placeholders}) \
             GROUP BY t.table_schema, t.table_name \
             ORDER BY t.table_schema, t.table_name"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(schemas.iter().copied()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut tables = Vec::new();
        for row in rows {
            let (schema, table, column_count) = row?;
            tables.push(TableInfo {
                table: TableRef::new(schema, table)?,
                column_count: usize::try_from(column_count).unwrap_or_default(),
            });
        }
        Ok(tables)
    }

    /// `COUNT(*)` over a table
    pub fn count_rows(&self, table: &TableRef) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.qualified());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Count rows where `column` is NULL
    pub fn count_nulls(&self, table: &TableRef, column: &str) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} IS NULL",
            table.qualified(),
            quote_ident(column)
        );
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Count distinct non-null values of `column`
    pub fn count_distinct(&self, table: &TableRef, column: &str) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(DISTINCT {}) FROM {}",
            quote_ident(column),
            table.qualified()
        );
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Minimum and maximum of a column, rendered as text
    pub fn min_max(&self, table: &TableRef, column: &str) -> Result<(Option<String>, Option<String>)> {
        let column = quote_ident(column);
        let sql = format!(
            "SELECT CAST(MIN({column}) AS VARCHAR), CAST(MAX({column}) AS VARCHAR) FROM {}",
            table.qualified()
        );
        Ok(self
            .conn
            .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))?)
    }

    /// Run a query and collect every value as text for display
    pub fn query_table(&self, sql: &str) -> Result<QueryTable> {
        // The VARCHAR cast renames columns, so names come from an empty probe first
        let columns = {
            let mut probe = self.conn.prepare(&format!("SELECT * FROM ({sql}) LIMIT 0"))?;
            let rows = probe.query([])?;
            let names = rows
                .as_ref()
                .map(|stmt| stmt.column_names())
                .unwrap_or_default();
            names
        };

        let wrapped = format!("SELECT COLUMNS(*)::VARCHAR FROM ({sql})");
        let mut stmt = self.conn.prepare(&wrapped)?;
        let mut rows = stmt.query([])?;

        let mut table = QueryTable {
            columns,
            rows: Vec::new(),
        };
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(table.columns.len());
            for index in 0..table.columns.len() {
                values.push(row.get::<_, Option<String>>(index)?);
            }
            table.rows.push(values);
        }
        Ok(table)
    }
}

/// Query result kept as display strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for QueryTable {
    /// Right-aligned plain text grid, one line per row
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |value: &Option<String>| value.clone().unwrap_or_else(|| "NULL".to_string());

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (width, value) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell(value).chars().count());
            }
        }

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(name, width)| format!("{name:>width$}"))
            .collect();
        writeln!(f, "{}", header.join("  "))?;

        for row in &self.rows {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!("{:>width$}", cell(value)))
                .collect();
            writeln!(f, "{}", line.join("  "))?;
        }

        if self.is_empty() {
            writeln!(f, "(no rows)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.connection()
            .execute_batch(
                "CREATE SCHEMA raw;
                 CREATE TABLE raw.orders (order_id VARCHAR, placed TIMESTAMP);
                 INSERT INTO raw.orders VALUES
                   ('a', '2017-01-05 10:00:00'),
                   ('b', '2018-03-01 08:30:00'),
                   (NULL, NULL),
                   ('a', '2017-02-01 00:00:00');",
            )
            .unwrap();
        db
    }

    #[test]
    fn test_catalog_queries() {
        let db = sample_db();
        let orders = TableRef::new("raw", "orders").unwrap();

        assert!(db.schema_exists("raw").unwrap());
        assert!(!db.schema_exists("dimensions").unwrap());
        assert!(db.table_exists(&orders).unwrap());

        let tables = db.list_tables(&["raw", "dimensions"]).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table, orders);
        assert_eq!(tables[0].column_count, 2);
        assert!(db.list_tables(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_counting_helpers() {
        let db = sample_db();
        let orders = TableRef::new("raw", "orders").unwrap();

        assert_eq!(db.count_rows(&orders).unwrap(), 4);
        assert_eq!(db.count_nulls(&orders, "order_id").unwrap(), 1);
        assert_eq!(db.count_distinct(&orders, "order_id").unwrap(), 2);

        let (min, max) = db.min_max(&orders, "placed").unwrap();
        assert!(min.unwrap().starts_with("2017-01-05"));
        assert!(max.unwrap().starts_with("2018-03-01"));
    }

    #[test]
    fn test_query_table_renders_nulls() {
        let db = sample_db();
        let table = db
            .query_table("SELECT order_id FROM raw.orders ORDER BY order_id NULLS LAST")
            .unwrap();

        assert_eq!(table.columns, vec!["order_id".to_string()]);
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.rows[3], vec![None]);

        let rendered = table.to_string();
        assert!(rendered.contains("order_id"));
        assert!(rendered.contains("NULL"));
    }

    #[test]
    fn test_empty_result_renders_placeholder() {
        let db = sample_db();
        let table = db
            .query_table("SELECT order_id, placed FROM raw.orders WHERE order_id = 'zzz'")
            .unwrap();

        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["order_id".to_string(), "placed".to_string()]);
        assert!(table.to_string().ends_with("(no rows)\n"));
    }

    #[test]
    fn test_read_only_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Database::open_read_only(&dir.path().join("missing.db"));
        assert!(matches!(result, Err(IngestError::ConnectionFailed { .. })));
    }
}
