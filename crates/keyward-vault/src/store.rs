//! Credential records and the record store boundary.
//!
//! The vault core treats row persistence as an external collaborator reached
//! through the [`RecordStore`] trait. The store owns identifiers and ordering
//! and never looks inside `secret_envelope`. [`SqliteRecordStore`] is the
//! implementation shipped with the crate.
//!
//! # Schema
//!
//! ```text
//! credentials(id INTEGER PRIMARY KEY, title, username, secret_envelope,
//!             website, notes, created_at, updated_at)
//! ```
//!
//! Timestamps are stored as Unix milliseconds.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Store-assigned identifier of a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One credential entry as held by the record store.
///
/// `secret_envelope` is the encoded output of
/// [`seal_envelope`](crate::crypto::seal_envelope); it never holds cleartext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: RecordId,
    pub title: String,
    pub username: String,
    pub secret_envelope: String,
    pub website: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Case-insensitive substring match against title, username and website.
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.username, &self.website]
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// A record that has not been assigned an identifier yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredentialRecord {
    pub title: String,
    pub username: String,
    pub secret_envelope: String,
    pub website: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Persistence boundary for credential records.
///
/// Concurrent writes to the same record are resolved by the implementation
/// (last write wins for [`SqliteRecordStore`]).
pub trait RecordStore: Send + Sync {
    /// Persist a new record and return its assigned identifier.
    fn insert(&self, record: &NewCredentialRecord) -> Result<RecordId>;

    /// Replace the stored record with the same `id`.
    ///
    /// Returns [`VaultError::NotFound`] if no such record exists.
    fn update(&self, record: &CredentialRecord) -> Result<()>;

    /// Delete the record. Returns [`VaultError::NotFound`] if it is absent.
    fn delete(&self, record: &CredentialRecord) -> Result<()>;

    fn get_by_id(&self, id: RecordId) -> Result<Option<CredentialRecord>>;

    /// Every record, ordered by title.
    fn query_all(&self) -> Result<Vec<CredentialRecord>>;

    /// Records whose title, username or website contains `pattern`, ignoring
    /// case, ordered by title.
    fn query_substring(&self, pattern: &str) -> Result<Vec<CredentialRecord>>;

    fn count(&self) -> Result<usize>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

const SELECT_COLUMNS: &str =
    "SELECT id, title, username, secret_envelope, website, notes, created_at, updated_at
     FROM credentials";

/// SQLite-backed [`RecordStore`].
///
/// The connection sits behind a `Mutex` so the store can be shared across
/// threads; each call holds the lock only for its own statement.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) the database at `path` and run schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] if the database cannot be opened.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "opening credential database");

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::configure_connection(&conn)?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Configure SQLite pragmas for performance and safety.
    fn configure_connection(conn: &Connection) -> Result<()> {
        // Several handles may open the same file; wait out their write locks.
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA temp_store = MEMORY;",
        )?;
        Ok(())
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        tracing::debug!("running credential schema migrations");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS credentials (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                username        TEXT NOT NULL,
                secret_envelope TEXT NOT NULL,
                website         TEXT NOT NULL DEFAULT '',
                notes           TEXT NOT NULL DEFAULT '',
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_credentials_title ON credentials(title);",
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VaultError::Internal(format!("connection mutex poisoned: {e}")))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<CredentialRecord> {
        Ok(CredentialRecord {
            id: RecordId(row.get(0)?),
            title: row.get(1)?,
            username: row.get(2)?,
            secret_envelope: row.get(3)?,
            website: row.get(4)?,
            notes: row.get(5)?,
            created_at: timestamp_column(row, 6)?,
            updated_at: timestamp_column(row, 7)?,
        })
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert(&self, record: &NewCredentialRecord) -> Result<RecordId> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO credentials (title, username, secret_envelope, website, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.title,
                record.username,
                record.secret_envelope,
                record.website,
                record.notes,
                record.created_at.timestamp_millis(),
                record.updated_at.timestamp_millis(),
            ],
        )?;

        let id = RecordId(conn.last_insert_rowid());
        tracing::debug!(%id, "inserted credential row");
        Ok(id)
    }

    fn update(&self, record: &CredentialRecord) -> Result<()> {
        let rows = self.conn()?.execute(
            "UPDATE credentials
             SET title = ?1, username = ?2, secret_envelope = ?3, website = ?4, notes = ?5,
                 created_at = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                record.title,
                record.username,
                record.secret_envelope,
                record.website,
                record.notes,
                record.created_at.timestamp_millis(),
                record.updated_at.timestamp_millis(),
                record.id.0,
            ],
        )?;

        if rows == 0 {
            return Err(VaultError::NotFound { id: record.id.0 });
        }
        Ok(())
    }

    fn delete(&self, record: &CredentialRecord) -> Result<()> {
        let rows = self
            .conn()?
            .execute("DELETE FROM credentials WHERE id = ?1", params![record.id.0])?;

        if rows == 0 {
            return Err(VaultError::NotFound { id: record.id.0 });
        }
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> Result<Option<CredentialRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.0],
                Self::map_row,
            )
            .optional()?;
        Ok(record)
    }

    fn query_all(&self) -> Result<Vec<CredentialRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY title ASC, id ASC"))?;
        let records = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tracing::debug!(count = records.len(), "listed credentials");
        Ok(records)
    }

    fn query_substring(&self, pattern: &str) -> Result<Vec<CredentialRecord>> {
        // SQLite's LIKE only folds ASCII case, so the match runs here.
        let needle = pattern.to_lowercase();
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY title ASC, id ASC"))?;
        let mut records = Vec::new();
        for row in stmt.query_map([], Self::map_row)? {
            let record = row?;
            if record.matches(&needle) {
                records.push(record);
            }
        }

        tracing::debug!(count = records.len(), "searched credentials");
        Ok(records)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM credentials", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| VaultError::Internal(format!("bad row count {count}")))
    }
}

/// Read a Unix-millisecond column, rejecting values chrono cannot represent.
fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Integer,
            format!("timestamp {ms} ms is out of range").into(),
        )
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(title: &str, username: &str, website: &str) -> NewCredentialRecord {
        let now = DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap();
        NewCredentialRecord {
            title: title.into(),
            username: username.into(),
            secret_envelope: "ZW52ZWxvcGU=".into(),
            website: website.into(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn insert_and_get() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let draft = new_record("Gmail", "bob", "mail.google.com");
        let id = store.insert(&draft).unwrap();

        let record = store.get_by_id(id).unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.title, "Gmail");
        assert_eq!(record.secret_envelope, "ZW52ZWxvcGU=");
        assert_eq!(record.created_at, draft.created_at);
    }

    #[test]
    fn ids_are_unique() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let a = store.insert(&new_record("a", "u", "")).unwrap();
        let b = store.insert(&new_record("b", "u", "")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn get_missing_returns_none() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        assert!(store.get_by_id(RecordId(42)).unwrap().is_none());
    }

    #[test]
    fn update_replaces_fields() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let id = store.insert(&new_record("Old", "u", "")).unwrap();

        let mut record = store.get_by_id(id).unwrap().unwrap();
        record.title = "New".into();
        record.secret_envelope = "bmV3".into();
        store.update(&record).unwrap();

        let stored = store.get_by_id(id).unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[test]
    fn update_missing_is_not_found() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let id = store.insert(&new_record("a", "u", "")).unwrap();
        let mut record = store.get_by_id(id).unwrap().unwrap();
        record.id = RecordId(999);
        assert!(matches!(
            store.update(&record),
            Err(VaultError::NotFound { id: 999 })
        ));
    }

    #[test]
    fn delete_removes_row() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let id = store.insert(&new_record("a", "u", "")).unwrap();
        let record = store.get_by_id(id).unwrap().unwrap();

        store.delete(&record).unwrap();
        assert!(store.get_by_id(id).unwrap().is_none());
        assert!(matches!(
            store.delete(&record),
            Err(VaultError::NotFound { .. })
        ));
    }

    #[test]
    fn query_all_orders_by_title() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store.insert(&new_record("Twitter", "u", "")).unwrap();
        store.insert(&new_record("Amazon", "u", "")).unwrap();
        store.insert(&new_record("GitHub", "u", "")).unwrap();

        let titles: Vec<String> = store
            .query_all()
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Amazon", "GitHub", "Twitter"]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn query_substring_matches_any_field_ignoring_case() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store.insert(&new_record("Gmail", "bob", "mail.google.com")).unwrap();
        store.insert(&new_record("Bank", "ALICE", "bank.example")).unwrap();
        store.insert(&new_record("Forum", "carol", "GOOGLE-groups.example")).unwrap();
        store.insert(&new_record("Straße", "dave", "")).unwrap();

        let titles = |pattern: &str| -> Vec<String> {
            store
                .query_substring(pattern)
                .unwrap()
                .into_iter()
                .map(|r| r.title)
                .collect()
        };

        assert_eq!(titles("google"), vec!["Forum", "Gmail"]);
        assert_eq!(titles("alice"), vec!["Bank"]);
        assert_eq!(titles("GMAIL"), vec!["Gmail"]);
        assert_eq!(titles("STRASSE"), Vec::<String>::new());
        assert_eq!(titles("STRAßE"), vec!["Straße"]);
        assert!(titles("nothing-like-this").is_empty());
    }

    #[test]
    fn out_of_range_timestamp_is_an_error() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let id = store.insert(&new_record("a", "u", "")).unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "UPDATE credentials SET updated_at = ?1 WHERE id = ?2",
                params![i64::MAX, id.0],
            )
            .unwrap();

        assert!(matches!(
            store.get_by_id(id),
            Err(VaultError::Database(
                rusqlite::Error::FromSqlConversionFailure(7, _, _)
            ))
        ));
        assert!(store.query_all().is_err());
    }

    #[test]
    fn file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");

        let id = {
            let store = SqliteRecordStore::open(&path).unwrap();
            store.insert(&new_record("Persisted", "u", "")).unwrap()
        };

        let reopened = SqliteRecordStore::open(&path).unwrap();
        assert_eq!(reopened.get_by_id(id).unwrap().unwrap().title, "Persisted");
    }
}
