//! Olist Ingestion Library
//!
//! Loads the Olist Brazilian e-commerce CSV extracts into a DuckDB database
//! and builds the reference tables downstream models join against.
//!
//! This library provides tools for:
//! - Provisioning the `raw` and `dimensions` schemas
//! - Loading each expected extract into its own raw table with type inference
//! - Generating a day-level calendar dimension for a range of years
//! - Building the Brazilian state/region lookup
//! - Read-only verification and canned exploration queries

pub mod cli;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod db;
pub mod error;
pub mod explore;
pub mod manifest;
pub mod pipeline;
pub mod verify;

// Re-export commonly used types
pub use config::{IngestConfig, VerifyConfig};
pub use db::Database;
pub use error::{IngestError, Result};
pub use manifest::{LoadManifest, TableRef};
pub use pipeline::calendar::{CalendarDay, CalendarRange, generate_calendar};
pub use pipeline::summary::IngestionSummary;
pub use pipeline::{IngestionPipeline, PipelineState};
pub use verify::{CheckStatus, VerificationReport, Verifier};
