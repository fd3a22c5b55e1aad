//! Backing store: one SQLite database file per strategy.
//!
//! [`prepare`] is the only call allowed to create a database. Iteration
//! connections go through [`connect`], which refuses to open a missing file,
//! so a misconfigured target fails before any iteration runs.

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS companies (
        id      INTEGER PRIMARY KEY AUTOINCREMENT,
        tax_id  TEXT NOT NULL,
        name    TEXT NOT NULL,
        city    TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS contacts (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id  INTEGER NOT NULL REFERENCES companies(id),
        name        TEXT NOT NULL,
        phone       TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_contacts_company_id ON contacts(company_id);
";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location of one strategy's database file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTarget {
    path: PathBuf,
}

impl StoreTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for StoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Per-connection settings. Foreign keys are enforced so a contact can never
/// point at a missing company.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA temp_store = MEMORY;
         PRAGMA cache_size = -16000;",
    )?;
    Ok(())
}

/// Create the database file (and its directory) if needed and make sure the
/// schema exists.
pub fn prepare(target: &StoreTarget) -> Result<()> {
    if let Some(dir) = target.path().parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating data directory {}", dir.display()))?;
        }
    }

    let conn = Connection::open(target.path())
        .with_context(|| format!("opening store {target}"))?;
    configure_connection(&conn).with_context(|| format!("configuring store {target}"))?;
    conn.execute_batch(SCHEMA)
        .with_context(|| format!("creating schema in {target}"))?;
    Ok(())
}

/// Open an iteration connection to an already prepared store.
pub fn connect(target: &StoreTarget) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        target.path(),
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("connecting to store {target}"))?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Truncate both tables and restart the id sequences.
pub fn reset(target: &StoreTarget) -> Result<()> {
    let conn = connect(target)?;
    conn.execute_batch(
        "BEGIN;
         DELETE FROM contacts;
         DELETE FROM companies;
         DELETE FROM sqlite_sequence WHERE name IN ('companies', 'contacts');
         COMMIT;",
    )
    .with_context(|| format!("truncating store {target}"))?;
    Ok(())
}

/// `(companies, contacts)` row counts.
pub fn counts(conn: &Connection) -> Result<(u64, u64)> {
    let companies: u64 = conn.query_row("SELECT COUNT(*) FROM companies", [], |r| r.get(0))?;
    let contacts: u64 = conn.query_row("SELECT COUNT(*) FROM contacts", [], |r| r.get(0))?;
    Ok((companies, contacts))
}

/// Contacts whose `company_id` does not match any company row.
pub fn orphan_contacts(conn: &Connection) -> Result<u64> {
    let orphans = conn.query_row(
        "SELECT COUNT(*) FROM contacts c
         LEFT JOIN companies p ON p.id = c.company_id
         WHERE p.id IS NULL",
        [],
        |r| r.get(0),
    )?;
    Ok(orphans)
}
