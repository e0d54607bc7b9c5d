//! Pipeline tests
//!
//! Exercise complete runs against throwaway database files and extract
//! directories.


use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `rows` data lines under a three-column header
pub(crate) fn write_extract(dir: &Path, file_name: &str, rows: usize) -> PathBuf {
    let mut content = String::from("id,name,created_at\n");
    for i in 0..rows {
        content.push_str(&format!(
            "{},name_{},2020-01-{:02} 10:{:02}:00\n",
            i,
            i,
            i % 28 + 1,
            i % 60
        ));
    }
    let path = dir.join(file_name);
    fs::write(&path, content).unwrap();
    path
}

/// Scratch directory with an empty `extracts/` folder and a database path
pub(crate) fn workspace() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let source_dir = temp_dir.path().join("extracts");
    fs::create_dir_all(&source_dir).unwrap();
    let db_path = temp_dir.path().join("test.db");
    (temp_dir, source_dir, db_path)
}
