//! Namespace provisioning.

use crate::constants::MANAGED_SCHEMAS;
use crate::db::Database;
use crate::error::Result;
use crate::manifest::quote_ident;
use tracing::info;

/// Ensure the raw and dimensions schemas exist; a no-op when they already do
pub fn provision_schemas(db: &Database) -> Result<()> {
    for schema in MANAGED_SCHEMAS {
        db.connection()
            .execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))?;
    }
    info!("Created schemas: {}", MANAGED_SCHEMAS.join(", "));
    Ok(())
}
