//! Error handling for ingestion operations.
//!
//! Covers connection, load, manifest and configuration failures. Missing
//! source files and verification findings are not errors: they are reported
//! through `LoadReport` and `VerificationReport` instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Failed to open database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        #[source]
        source: duckdb::Error,
    },

    #[error("Source directory not found: {path}")]
    MissingDirectory { path: PathBuf },

    #[error("Failed to load {path} into raw.{table}: {source}")]
    LoadFailed {
        table: String,
        path: PathBuf,
        #[source]
        source: duckdb::Error,
    },

    #[error("Invalid SQL identifier: '{name}'")]
    InvalidIdentifier { name: String },

    #[error("Invalid load manifest: {reason}")]
    InvalidManifest { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl IngestError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a manifest validation error
    pub fn invalid_manifest(reason: impl Into<String>) -> Self {
        Self::InvalidManifest {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
