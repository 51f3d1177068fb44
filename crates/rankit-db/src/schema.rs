//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Rating records use a deterministic
//! record id derived from the (user, item) pair, which makes that
//! pair's uniqueness structural rather than a check-then-insert.

use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, Deserialize)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD groups_joined ON TABLE user TYPE array DEFAULT [];
DEFINE FIELD groups_joined.* ON TABLE user TYPE string;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Groups
-- =======================================================================
DEFINE TABLE group SCHEMAFULL;
DEFINE FIELD name ON TABLE group TYPE string;
DEFINE FIELD description ON TABLE group TYPE string;
DEFINE FIELD created_by ON TABLE group TYPE string;
DEFINE FIELD members ON TABLE group TYPE array;
DEFINE FIELD members.* ON TABLE group TYPE string;
DEFINE FIELD admins ON TABLE group TYPE array;
DEFINE FIELD admins.* ON TABLE group TYPE string;
DEFINE FIELD member_count ON TABLE group TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD created_at ON TABLE group TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_group_created_at ON TABLE group COLUMNS created_at;
DEFINE INDEX idx_group_members ON TABLE group COLUMNS members;

-- =======================================================================
-- Items
-- =======================================================================
DEFINE TABLE item SCHEMAFULL;
DEFINE FIELD group_id ON TABLE item TYPE string;
DEFINE FIELD name ON TABLE item TYPE string;
DEFINE FIELD description ON TABLE item TYPE string;
DEFINE FIELD added_by ON TABLE item TYPE string;
DEFINE FIELD rating_count ON TABLE item TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD rating_sum ON TABLE item TYPE int;
DEFINE FIELD avg_rating ON TABLE item TYPE float;
DEFINE FIELD created_at ON TABLE item TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_item_group ON TABLE item COLUMNS group_id;
DEFINE INDEX idx_item_leaderboard ON TABLE item \
    COLUMNS avg_rating, rating_count;

-- =======================================================================
-- Ratings
-- =======================================================================
-- The record id is derived from (user_id, item_id); the unique index on
-- the same pair is a backstop for that invariant.
DEFINE TABLE rating SCHEMAFULL;
DEFINE FIELD user_id ON TABLE rating TYPE string;
DEFINE FIELD group_id ON TABLE rating TYPE string;
DEFINE FIELD item_id ON TABLE rating TYPE string;
DEFINE FIELD score ON TABLE rating TYPE int \
    ASSERT $value >= 1 AND $value <= 5;
DEFINE FIELD created_at ON TABLE rating TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE rating TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_rating_user_item ON TABLE rating \
    COLUMNS user_id, item_id UNIQUE;
DEFINE INDEX idx_rating_item ON TABLE rating COLUMNS item_id;
DEFINE INDEX idx_rating_group ON TABLE rating COLUMNS group_id;
DEFINE INDEX idx_rating_user_group ON TABLE rating \
    COLUMNS user_id, group_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}
