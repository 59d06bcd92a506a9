// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded campus database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized User
//! - `users_by_telegram`: telegram_id → user_id (unique external identity)
//! - `news`, `hackathons`, `clubs`, `gov_members`: id → serialized entity
//! - `hackathon_applications`: id → serialized application
//! - `hackathon_application_index`: `hackathon|user` → application id (unique)
//! - `club_members`: `club|user` → joined-at unix timestamp
//! - `attendance`: id → serialized check-in
//! - `attendance_day_index`: `user|day|event` → attendance id (unique)
//! - `shop_items`, `purchases`: id → serialized entity
//! - `sequences`: table name → last issued id
//!
//! ## Concurrency
//!
//! redb admits a single write transaction at a time and serves readers from
//! MVCC snapshots. Every multi-row mutation (upsert, check-in, purchase) runs
//! inside one write transaction, so no partial state is ever observable.

use std::path::Path;

use redb::{
    ReadTransaction, ReadableDatabase, ReadableTable, Table, TableDefinition, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
pub(crate) const USERS_BY_TELEGRAM: TableDefinition<i64, u64> =
    TableDefinition::new("users_by_telegram");

pub(crate) const NEWS: TableDefinition<u64, &[u8]> = TableDefinition::new("news");

pub(crate) const HACKATHONS: TableDefinition<u64, &[u8]> = TableDefinition::new("hackathons");
pub(crate) const HACKATHON_APPLICATIONS: TableDefinition<u64, &[u8]> =
    TableDefinition::new("hackathon_applications");
pub(crate) const HACKATHON_APPLICATION_INDEX: TableDefinition<&str, u64> =
    TableDefinition::new("hackathon_application_index");

pub(crate) const CLUBS: TableDefinition<u64, &[u8]> = TableDefinition::new("clubs");
pub(crate) const CLUB_MEMBERS: TableDefinition<&str, i64> = TableDefinition::new("club_members");

pub(crate) const GOV_MEMBERS: TableDefinition<u64, &[u8]> = TableDefinition::new("gov_members");

pub(crate) const ATTENDANCE: TableDefinition<u64, &[u8]> = TableDefinition::new("attendance");
pub(crate) const ATTENDANCE_DAY_INDEX: TableDefinition<&str, u64> =
    TableDefinition::new("attendance_day_index");

pub(crate) const SHOP_ITEMS: TableDefinition<u64, &[u8]> = TableDefinition::new("shop_items");
pub(crate) const PURCHASES: TableDefinition<u64, &[u8]> = TableDefinition::new("purchases");

/// Sequence table: entity table name → last issued id.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

// =============================================================================
// Error Type
// =============================================================================

/// Uniqueness violations surfaced to callers as structured values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    #[error("already applied to this hackathon")]
    DuplicateApplication,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Conflict(#[from] Conflict),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID campus database.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_TELEGRAM)?;
            let _ = write_txn.open_table(NEWS)?;
            let _ = write_txn.open_table(HACKATHONS)?;
            let _ = write_txn.open_table(HACKATHON_APPLICATIONS)?;
            let _ = write_txn.open_table(HACKATHON_APPLICATION_INDEX)?;
            let _ = write_txn.open_table(CLUBS)?;
            let _ = write_txn.open_table(CLUB_MEMBERS)?;
            let _ = write_txn.open_table(GOV_MEMBERS)?;
            let _ = write_txn.open_table(ATTENDANCE)?;
            let _ = write_txn.open_table(ATTENDANCE_DAY_INDEX)?;
            let _ = write_txn.open_table(SHOP_ITEMS)?;
            let _ = write_txn.open_table(PURCHASES)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn begin_write(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    pub(crate) fn begin_read(&self) -> StoreResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    /// Cheap readiness probe: opens a read snapshot and touches the users table.
    pub fn ping(&self) -> StoreResult<()> {
        let read_txn = self.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

/// Issue the next id for `sequence` inside an open write transaction.
///
/// Ids start at 1 and are never reused, even after deletes.
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> StoreResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let current = table.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

/// Read and deserialize a JSON row by id.
pub(crate) fn read_json<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> StoreResult<Option<T>> {
    match table.get(id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

/// Serialize and store a JSON row by id.
pub(crate) fn write_json<T: Serialize>(
    table: &mut Table<'_, u64, &'static [u8]>,
    id: u64,
    value: &T,
) -> StoreResult<()> {
    let json = serde_json::to_vec(value)?;
    table.insert(id, json.as_slice())?;
    Ok(())
}

/// Deserialize every row of a table in ascending id order.
pub(crate) fn scan_json<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
) -> StoreResult<Vec<T>> {
    let mut rows = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        rows.push(serde_json::from_slice(value.value())?);
    }
    Ok(rows)
}

/// Build a composite key for pair index tables.
///
/// Ids are zero-padded so lexicographic order matches numeric order and a
/// `first|` prefix selects every pair for `first`.
pub(crate) fn pair_key(first: u64, second: u64) -> String {
    format!("{first:020}|{second:020}")
}

/// Half-open key range covering every pair whose first component is `first`.
pub(crate) fn pair_prefix_range(first: u64) -> (String, String) {
    // '}' sorts immediately after '|'
    (format!("{first:020}|"), format!("{first:020}}}"))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn temp_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    #[test]
    fn open_creates_tables_and_pings() {
        let (db, _dir) = temp_db();
        db.ping().unwrap();
    }

    #[test]
    fn sequences_are_monotonic_per_table() {
        let (db, _dir) = temp_db();
        let txn = db.begin_write().unwrap();
        assert_eq!(next_id(&txn, "news").unwrap(), 1);
        assert_eq!(next_id(&txn, "news").unwrap(), 2);
        assert_eq!(next_id(&txn, "clubs").unwrap(), 1);
        txn.commit().unwrap();

        let txn = db.begin_write().unwrap();
        assert_eq!(next_id(&txn, "news").unwrap(), 3);
    }

    #[test]
    fn aborted_sequence_is_not_persisted() {
        let (db, _dir) = temp_db();
        let txn = db.begin_write().unwrap();
        assert_eq!(next_id(&txn, "users").unwrap(), 1);
        txn.abort().unwrap();

        let txn = db.begin_write().unwrap();
        assert_eq!(next_id(&txn, "users").unwrap(), 1);
    }

    #[test]
    fn pair_keys_sort_numerically_and_prefix_match() {
        assert!(pair_key(2, 1) < pair_key(10, 1));
        let (start, end) = pair_prefix_range(7);
        let key = pair_key(7, 123);
        assert!(key.as_str() >= start.as_str() && key.as_str() < end.as_str());
        assert!(pair_key(8, 0).as_str() >= end.as_str());
    }
}
