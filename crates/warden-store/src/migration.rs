//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL
//! string that transforms the schema from version N to N+1.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Get current version
    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Apply migrations
    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;
            info!(version, "applied schema migration");

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Append-only ledger of authorization decisions
        CREATE TABLE audit_entries (
            seq INTEGER PRIMARY KEY,          -- 1-indexed sequence number
            action TEXT NOT NULL,             -- operation category
            subject TEXT NOT NULL,            -- tool/resource acted upon
            params BLOB NOT NULL,             -- CBOR map of argument name -> value
            outcome INTEGER NOT NULL,         -- 0=allowed, 1=denied
            reason TEXT,                      -- denial reason, NULL when allowed
            context_id TEXT,                  -- correlation id, nullable
            timestamp INTEGER NOT NULL,       -- ledger-assigned (Unix ms)
            prev_tag BLOB NOT NULL,           -- 32 bytes, predecessor tag or genesis
            tag BLOB NOT NULL                 -- 32 bytes, keyed tag over canonical bytes
        );

        -- Capability grants; revoked rows are kept for audit
        CREATE TABLE grants (
            grant_id BLOB PRIMARY KEY,        -- 16 bytes, random
            capability TEXT NOT NULL,         -- permission class or "*"
            scope TEXT NOT NULL,              -- resource pattern
            issuer TEXT NOT NULL,
            issued_at INTEGER NOT NULL,       -- Unix ms
            revoked INTEGER NOT NULL DEFAULT 0
        );

        -- Indexes for operator queries
        CREATE INDEX idx_entries_action ON audit_entries(action);
        CREATE INDEX idx_entries_subject ON audit_entries(subject);
        CREATE INDEX idx_entries_timestamp ON audit_entries(timestamp);
        CREATE INDEX idx_grants_revoked ON grants(revoked);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
