//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend for the Warden ledger. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use warden_core::{AuditEntry, CapabilityGrant, GrantId, Outcome, Params, Tag};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{EntryFilter, GrantStore, LedgerStore};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking to
/// avoid blocking the async runtime during durable writes.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;
        migration::migrate(&mut conn)?;
        debug!(path = %path.as_ref().display(), "opened ledger database");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Run a closure on the connection inside spawn_blocking.
async fn with_conn<T, F>(conn: Arc<Mutex<Connection>>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = conn
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        f(&conn)
    })
    .await
    .map_err(|e| StoreError::Background(e.to_string()))?
}

/// Encode a parameter map to CBOR for storage.
fn encode_params(params: &Params) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(params, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

// Helper to convert a row to an AuditEntry
fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let params_cbor: Vec<u8> = row.get("params")?;
    let outcome_code: u8 = row.get("outcome")?;
    let reason: Option<String> = row.get("reason")?;
    let prev_tag_bytes: Vec<u8> = row.get("prev_tag")?;
    let tag_bytes: Vec<u8> = row.get("tag")?;

    let params: Params = ciborium::from_reader(&params_cbor[..]).map_err(|_| {
        rusqlite::Error::InvalidColumnType(3, "params".into(), rusqlite::types::Type::Blob)
    })?;

    let outcome = Outcome::from_code(outcome_code, reason).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(4, "outcome".into(), rusqlite::types::Type::Integer)
    })?;

    let prev_tag = Tag::from_bytes(prev_tag_bytes.try_into().map_err(|_| {
        rusqlite::Error::InvalidColumnType(8, "prev_tag".into(), rusqlite::types::Type::Blob)
    })?);
    let tag = Tag::from_bytes(tag_bytes.try_into().map_err(|_| {
        rusqlite::Error::InvalidColumnType(9, "tag".into(), rusqlite::types::Type::Blob)
    })?);

    Ok(AuditEntry {
        seq: row.get::<_, i64>("seq")? as u64,
        action: row.get("action")?,
        subject: row.get("subject")?,
        params,
        outcome,
        context_id: row.get("context_id")?,
        timestamp: row.get("timestamp")?,
        prev_tag,
        tag,
    })
}

// Helper to convert a row to a CapabilityGrant
fn row_to_grant(row: &rusqlite::Row<'_>) -> rusqlite::Result<CapabilityGrant> {
    let id_bytes: Vec<u8> = row.get("grant_id")?;
    let id = GrantId::from_bytes(id_bytes.try_into().map_err(|_| {
        rusqlite::Error::InvalidColumnType(0, "grant_id".into(), rusqlite::types::Type::Blob)
    })?);

    Ok(CapabilityGrant {
        id,
        capability: row.get("capability")?,
        scope: row.get("scope")?,
        issuer: row.get("issuer")?,
        issued_at: row.get("issued_at")?,
        revoked: row.get::<_, i64>("revoked")? != 0,
    })
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn append_entry(&self, entry: &AuditEntry) -> Result<()> {
        let entry = entry.clone();
        let conn = self.conn.clone();

        with_conn(conn, move |conn| {
            // Check for an existing row at this sequence first, so the
            // caller gets SequenceExists rather than a bare constraint
            // violation.
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT seq FROM audit_entries WHERE seq = ?1",
                    params![entry.seq as i64],
                    |row| row.get(0),
                )
                .optional()?;

            if existing.is_some() {
                return Err(StoreError::SequenceExists(entry.seq));
            }

            let params_cbor = encode_params(&entry.params)?;

            conn.execute(
                "INSERT INTO audit_entries (
                    seq, action, subject, params, outcome, reason,
                    context_id, timestamp, prev_tag, tag
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    entry.seq as i64,
                    entry.action,
                    entry.subject,
                    params_cbor,
                    entry.outcome.to_code() as i64,
                    entry.outcome.reason(),
                    entry.context_id,
                    entry.timestamp,
                    entry.prev_tag.as_bytes().as_slice(),
                    entry.tag.as_bytes().as_slice(),
                ],
            )?;

            Ok(())
        })
        .await
    }

    async fn last_entry(&self) -> Result<Option<AuditEntry>> {
        let conn = self.conn.clone();

        with_conn(conn, |conn| {
            conn.query_row(
                "SELECT seq, action, subject, params, outcome, reason,
                        context_id, timestamp, prev_tag, tag
                 FROM audit_entries ORDER BY seq DESC LIMIT 1",
                [],
                row_to_entry,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn entries(&self, filter: &EntryFilter) -> Result<Vec<AuditEntry>> {
        let filter = filter.clone();
        let conn = self.conn.clone();

        with_conn(conn, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, action, subject, params, outcome, reason,
                        context_id, timestamp, prev_tag, tag
                 FROM audit_entries ORDER BY seq",
            )?;

            // Filtering happens in process so SQLite and MemoryStore share
            // one predicate implementation.
            let entries = stmt
                .query_map([], row_to_entry)?
                .collect::<std::result::Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|e| filter.matches(e))
                .collect();

            Ok(entries)
        })
        .await
    }

    async fn entry_count(&self) -> Result<u64> {
        let conn = self.conn.clone();

        with_conn(conn, |conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM audit_entries", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

#[async_trait]
impl GrantStore for SqliteStore {
    async fn insert_grant(&self, grant: &CapabilityGrant) -> Result<()> {
        let grant = grant.clone();
        let conn = self.conn.clone();

        with_conn(conn, move |conn| {
            conn.execute(
                "INSERT INTO grants (grant_id, capability, scope, issuer, issued_at, revoked)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    grant.id.as_bytes().as_slice(),
                    grant.capability,
                    grant.scope,
                    grant.issuer,
                    grant.issued_at,
                    grant.revoked as i64,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_grant(&self, id: &GrantId) -> Result<Option<CapabilityGrant>> {
        let id = *id;
        let conn = self.conn.clone();

        with_conn(conn, move |conn| {
            conn.query_row(
                "SELECT grant_id, capability, scope, issuer, issued_at, revoked
                 FROM grants WHERE grant_id = ?1",
                params![id.as_bytes().as_slice()],
                row_to_grant,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn mark_revoked(&self, id: &GrantId) -> Result<bool> {
        let id = *id;
        let conn = self.conn.clone();

        with_conn(conn, move |conn| {
            // UPDATE affects the row even when revoked is already 1, which
            // gives the idempotent "revoking twice succeeds" semantics.
            let changed = conn.execute(
                "UPDATE grants SET revoked = 1 WHERE grant_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn active_grants(&self) -> Result<Vec<CapabilityGrant>> {
        let conn = self.conn.clone();

        with_conn(conn, |conn| {
            let mut stmt = conn.prepare(
                "SELECT grant_id, capability, scope, issuer, issued_at, revoked
                 FROM grants WHERE revoked = 0 ORDER BY issued_at, rowid",
            )?;
            let grants = stmt
                .query_map([], row_to_grant)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(grants)
        })
        .await
    }

    async fn list_grants(&self) -> Result<Vec<CapabilityGrant>> {
        let conn = self.conn.clone();

        with_conn(conn, |conn| {
            let mut stmt = conn.prepare(
                "SELECT grant_id, capability, scope, issuer, issued_at, revoked
                 FROM grants ORDER BY issued_at, rowid",
            )?;
            let grants = stmt
                .query_map([], row_to_grant)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(grants)
        })
        .await
    }
}
