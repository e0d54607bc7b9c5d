//! Application constants for the Olist ingestion pipeline
//!
//! Namespace names, default paths, CSV reader options and the default
//! load manifest used throughout the crate.

// =============================================================================
// Namespaces
// =============================================================================

/// Staging namespace holding one table per source extract
pub const RAW_SCHEMA: &str = "raw";

/// Derived namespace holding the calendar and region lookup tables
pub const DIMENSIONS_SCHEMA: &str = "dimensions";

/// Namespaces the pipeline provisions and reports on, in summary order
pub const MANAGED_SCHEMAS: &[&str] = &[DIMENSIONS_SCHEMA, RAW_SCHEMA];

/// Calendar dimension table name
pub const CALENDAR_TABLE: &str = "calendar";

/// Region lookup dimension table name
pub const REGION_LOOKUP_TABLE: &str = "region_lookup";

// =============================================================================
// Defaults
// =============================================================================

/// Default DuckDB database file
pub const DEFAULT_DB_PATH: &str = "ask_your_data.db";

/// Default directory holding the downloaded CSV extracts
pub const DEFAULT_SOURCE_DIR: &str = "data/raw";

/// Calendar bounds covering the Olist order history (2016-2018) plus headroom
pub const DEFAULT_CALENDAR_START_YEAR: i32 = 2016;
pub const DEFAULT_CALENDAR_END_YEAR: i32 = 2025;

/// Rows shown per sample query during verification
pub const DEFAULT_SAMPLE_ROWS: usize = 3;

// =============================================================================
// CSV Reader Options
// =============================================================================

/// The single timestamp format accepted for date/time-looking columns
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// String treated as NULL while reading extracts
pub const CSV_NULL_STRING: &str = "";

// =============================================================================
// Load Manifest
// =============================================================================

/// Expected Olist extracts as (source file, raw table) pairs
pub const OLIST_MANIFEST: &[(&str, &str)] = &[
    ("olist_customers_dataset.csv", "customers"),
    ("olist_geolocation_dataset.csv", "geolocation"),
    ("olist_orders_dataset.csv", "orders"),
    ("olist_order_items_dataset.csv", "order_items"),
    ("olist_order_payments_dataset.csv", "order_payments"),
    ("olist_order_reviews_dataset.csv", "order_reviews"),
    ("olist_products_dataset.csv", "products"),
    ("olist_sellers_dataset.csv", "sellers"),
    (
        "product_category_name_translation.csv",
        "product_category_translation",
    ),
];

// =============================================================================
// Verification Targets
// =============================================================================

/// Primary transactional table and the columns the verifier inspects
pub mod verification {
    pub const PRIMARY_TABLE: &str = "orders";
    pub const KEY_COLUMN: &str = "order_id";
    pub const TIMESTAMP_COLUMN: &str = "order_purchase_timestamp";

    /// Child table whose distinct keys are compared against the primary table
    pub const CHILD_TABLE: &str = "order_items";

    /// Calendar dates spot-checked in the sample output
    pub const CALENDAR_SAMPLE_DATES: &[&str] = &["2017-01-01", "2018-06-15", "2025-12-31"];

    /// Region rows shown in the sample output
    pub const REGION_SAMPLE_ROWS: usize = 5;
}

// =============================================================================
// Dataset Provider Credentials
// =============================================================================

pub mod credentials {
    pub const USERNAME_ENV: &str = "KAGGLE_USERNAME";
    pub const KEY_ENV: &str = "KAGGLE_KEY";
    pub const CONFIG_DIR: &str = ".kaggle";
    pub const CONFIG_FILE: &str = "kaggle.json";
    pub const DATASET: &str = "olistbr/brazilian-ecommerce";
}
