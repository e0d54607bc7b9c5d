//! Load manifest and SQL identifier handling.
//!
//! Table names reach SQL only as validated, quoted identifiers. The manifest
//! is a closed list built once and checked at construction, so nothing from
//! the filesystem or the command line is spliced into a statement unchecked.

use crate::constants::OLIST_MANIFEST;
use crate::error::{IngestError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Check that `name` is a plain SQL identifier
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(IngestError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// Double-quote an identifier, escaping embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal, escaping embedded quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// A schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    /// Build a table reference, rejecting anything that is not a plain identifier
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Result<Self> {
        let schema = schema.into();
        let table = table.into();
        validate_identifier(&schema)?;
        validate_identifier(&table)?;
        Ok(Self { schema, table })
    }

    /// Quoted `"schema"."table"` form for use in SQL
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// One expected source extract and the raw table it lands in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file_name: String,
    pub table: String,
}

/// Fixed mapping from source file names to raw table names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ManifestEntry>", into = "Vec<ManifestEntry>")]
pub struct LoadManifest {
    entries: Vec<ManifestEntry>,
}

impl LoadManifest {
    /// Build a manifest from (file, table) pairs
    ///
    /// Table names must be unique identifiers and file names must not carry
    /// any directory component.
    pub fn new<F, T>(pairs: impl IntoIterator<Item = (F, T)>) -> Result<Self>
    where
        F: Into<String>,
        T: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(file_name, table)| ManifestEntry {
                file_name: file_name.into(),
                table: table.into(),
            })
            .collect();
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<ManifestEntry>) -> Result<Self> {
        let mut tables = HashSet::new();
        let mut files = HashSet::new();

        for entry in &entries {
            validate_identifier(&entry.table)?;

            if entry.file_name.is_empty()
                || entry.file_name.contains(['/', '\\'])
                || entry.file_name == "."
                || entry.file_name == ".."
            {
                return Err(IngestError::invalid_manifest(format!(
                    "'{}' is not a plain file name",
                    entry.file_name
                )));
            }
            if !tables.insert(entry.table.to_ascii_lowercase()) {
                return Err(IngestError::invalid_manifest(format!(
                    "table '{}' appears more than once",
                    entry.table
                )));
            }
            if !files.insert(entry.file_name.as_str()) {
                return Err(IngestError::invalid_manifest(format!(
                    "file '{}' appears more than once",
                    entry.file_name
                )));
            }
        }

        Ok(Self { entries })
    }

    /// The nine Olist extracts
    pub fn olist() -> Self {
        Self {
            entries: OLIST_MANIFEST
                .iter()
                .map(|(file_name, table)| ManifestEntry {
                    file_name: file_name.to_string(),
                    table: table.to_string(),
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LoadManifest {
    fn default() -> Self {
        Self::olist()
    }
}

impl TryFrom<Vec<ManifestEntry>> for LoadManifest {
    type Error = IngestError;

    fn try_from(entries: Vec<ManifestEntry>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

impl From<LoadManifest> for Vec<ManifestEntry> {
    fn from(manifest: LoadManifest) -> Self {
        manifest.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_olist_manifest_is_valid() {
        let manifest = LoadManifest::olist();
        assert_eq!(manifest.len(), 9);

        let rebuilt = LoadManifest::new(
            manifest
                .entries()
                .iter()
                .map(|e| (e.file_name.clone(), e.table.clone())),
        )
        .unwrap();
        assert_eq!(rebuilt, manifest);
        assert!(manifest.entries().iter().any(|e| e.table == "order_items"));
        assert!(!manifest.entries().iter().any(|e| e.table == "calendar"));
    }

    #[test]
    fn test_rejects_injection_in_table_name() {
        let result = LoadManifest::new([("a.csv", "orders; DROP SCHEMA raw")]);
        assert!(matches!(result, Err(IngestError::InvalidIdentifier { .. })));
    }

    #[test]
    fn test_rejects_duplicate_tables() {
        let result = LoadManifest::new([("a.csv", "orders"), ("b.csv", "Orders")]);
        assert!(matches!(result, Err(IngestError::InvalidManifest { .. })));
    }

    #[test]
    fn test_rejects_paths_in_file_names() {
        let result = LoadManifest::new([("../secret.csv", "orders")]);
        assert!(matches!(result, Err(IngestError::InvalidManifest { .. })));
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_ident("orders"), "\"orders\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_literal("it's.csv"), "'it''s.csv'");

        let table = TableRef::new("raw", "orders").unwrap();
        assert_eq!(table.qualified(), "\"raw\".\"orders\"");
        assert_eq!(table.to_string(), "raw.orders");
        assert!(TableRef::new("raw", "1orders").is_err());
    }
}
