//! # Snapshot Store
//!
//! Append-only SQLite table of [`Snapshot`] rows.
//!
//! The contract is deliberately small:
//!
//! - **`init`**: create the schema if absent, safe to call every run
//! - **`insert`**: one row, inside a transaction, committed fully or not at all
//! - **`read_all`**: every row in insertion order
//! - **`latest_collected_at`**: the newest capture time, for the gatekeeper
//!
//! There is no update or delete. Failures are not retried here; callers log
//! and exit abnormally for a scheduled run.

use std::path::Path;

use chrono::{
    DateTime,
    NaiveDateTime,
    Utc,
};
use rusqlite::{
    params,
    Connection,
};

use crate::{
    errors::StoreError,
    stats::{
        NewSnapshot,
        Snapshot,
    },
};

/// Storage format for `collected_at`: naive UTC, microsecond precision.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub struct SnapshotStore {
    pub(crate) conn: Connection,
}

impl SnapshotStore {
    /// Open (or create) the database file, creating parent directories first.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_owned(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        Ok(Self { conn })
    }

    /// Create the snapshots table and its indexes if absent. Idempotent.
    pub fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                indv_reg_users BIGINT NOT NULL,
                e_verified_returns BIGINT NOT NULL,
                total_aadhar_linked_pan BIGINT NOT NULL,
                total_processed_refund BIGINT NOT NULL,
                provider_last_updated_raw VARCHAR(64),
                collected_at VARCHAR NOT NULL,
                collected_date VARCHAR(10) NOT NULL
            );
            CREATE INDEX IF NOT EXISTS ix_snapshots_collected_at
                ON snapshots (collected_at);
            CREATE INDEX IF NOT EXISTS ix_snapshots_collected_date
                ON snapshots (collected_date);",
        )?;
        Ok(())
    }

    /// Write one snapshot atomically and return it with its assigned id.
    pub fn insert(&mut self, snapshot: &NewSnapshot) -> Result<Snapshot, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO snapshots (
                indv_reg_users, e_verified_returns, total_aadhar_linked_pan,
                total_processed_refund, provider_last_updated_raw,
                collected_at, collected_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                snapshot.indv_reg_users as i64,
                snapshot.e_verified_returns as i64,
                snapshot.total_aadhar_linked_pan as i64,
                snapshot.total_processed_refund as i64,
                snapshot.provider_last_updated_raw,
                snapshot.collected_at.format(TIMESTAMP_FORMAT).to_string(),
                snapshot.collected_date,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Snapshot {
            id,
            indv_reg_users: snapshot.indv_reg_users,
            e_verified_returns: snapshot.e_verified_returns,
            total_aadhar_linked_pan: snapshot.total_aadhar_linked_pan,
            total_processed_refund: snapshot.total_processed_refund,
            provider_last_updated_raw: snapshot.provider_last_updated_raw.clone(),
            collected_at: snapshot.collected_at,
            collected_date: snapshot.collected_date.clone(),
        })
    }

    /// Every persisted snapshot, in insertion (surrogate id) order.
    pub fn read_all(&self) -> Result<Vec<Snapshot>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, indv_reg_users, e_verified_returns, total_aadhar_linked_pan,
                    total_processed_refund, provider_last_updated_raw,
                    collected_at, collected_date
             FROM snapshots
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)? as u64,
                row.get::<_, i64>(2)? as u64,
                row.get::<_, i64>(3)? as u64,
                row.get::<_, i64>(4)? as u64,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut snapshots = Vec::new();
        for row in rows {
            let (
                id,
                indv_reg_users,
                e_verified_returns,
                total_aadhar_linked_pan,
                total_processed_refund,
                provider_last_updated_raw,
                collected_at,
                collected_date,
            ) = row?;
            snapshots.push(Snapshot {
                id,
                indv_reg_users,
                e_verified_returns,
                total_aadhar_linked_pan,
                total_processed_refund,
                provider_last_updated_raw,
                collected_at: parse_timestamp(&collected_at)?,
                collected_date,
            });
        }
        Ok(snapshots)
    }

    /// Capture time of the newest snapshot, or `None` for an empty table.
    pub fn latest_collected_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let raw: Option<String> =
            self.conn
                .query_row("SELECT MAX(collected_at) FROM snapshots", [], |row| {
                    row.get(0)
                })?;
        raw.map(|text| parse_timestamp(&text)).transpose()
    }
}

/// The one shared normalization for stored capture times.
///
/// SQLite hands timestamps back as text, usually in the naive format this
/// store writes. Naive strings are reinterpreted as UTC so they are never
/// compared against an aware now; aware RFC 3339 strings are accepted too.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
        return Ok(aware.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(StoreError::BadTimestamp(raw.to_owned()))
}
