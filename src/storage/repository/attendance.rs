// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Attendance check-ins and coin rewards.
//!
//! A user may check in to a given event once per UTC day. The
//! `attendance_day_index` table enforces that inside the same write
//! transaction that inserts the row and credits the coins.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::User;
use crate::storage::database::{
    next_id, read_json, write_json, Database, StoreError, StoreResult, ATTENDANCE,
    ATTENDANCE_DAY_INDEX, USERS,
};

/// Append-only check-in record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub user_id: u64,
    pub event_name: String,
    /// Coins awarded for this check-in
    pub coins: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error("already checked in for this event today")]
    DuplicateCheckIn,

    #[error("user {0} not found")]
    UserNotFound(u64),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<redb::TableError> for CheckInError {
    fn from(e: redb::TableError) -> Self {
        CheckInError::Storage(e.into())
    }
}

impl From<redb::StorageError> for CheckInError {
    fn from(e: redb::StorageError) -> Self {
        CheckInError::Storage(e.into())
    }
}

impl From<redb::CommitError> for CheckInError {
    fn from(e: redb::CommitError) -> Self {
        CheckInError::Storage(e.into())
    }
}

/// Uniqueness key: one check-in per user, UTC day and event.
fn day_key(user_id: u64, at: DateTime<Utc>, event_name: &str) -> String {
    format!("{user_id:020}|{}|{}", at.format("%Y-%m-%d"), event_name.trim())
}

pub struct AttendanceRepository<'a> {
    db: &'a Database,
}

impl<'a> AttendanceRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record a check-in and credit `coins` to the user.
    pub fn check_in(
        &self,
        user_id: u64,
        event_name: &str,
        coins: u64,
    ) -> Result<Attendance, CheckInError> {
        self.check_in_at(user_id, event_name, coins, Utc::now())
    }

    pub(crate) fn check_in_at(
        &self,
        user_id: u64,
        event_name: &str,
        coins: u64,
        now: DateTime<Utc>,
    ) -> Result<Attendance, CheckInError> {
        let write_txn = self.db.begin_write().map_err(CheckInError::Storage)?;
        match Self::check_in_in(&write_txn, user_id, event_name, coins, now) {
            Ok(record) => {
                write_txn.commit()?;
                tracing::info!(user_id, event = %record.event_name, coins, "Check-in recorded");
                Ok(record)
            }
            Err(e) => {
                write_txn.abort()?;
                Err(e)
            }
        }
    }

    fn check_in_in(
        write_txn: &redb::WriteTransaction,
        user_id: u64,
        event_name: &str,
        coins: u64,
        now: DateTime<Utc>,
    ) -> Result<Attendance, CheckInError> {
        let key = day_key(user_id, now, event_name);
        let mut index = write_txn.open_table(ATTENDANCE_DAY_INDEX)?;
        if index.get(key.as_str())?.is_some() {
            return Err(CheckInError::DuplicateCheckIn);
        }

        let mut users = write_txn.open_table(USERS)?;
        let mut user: User =
            read_json(&users, user_id)?.ok_or(CheckInError::UserNotFound(user_id))?;

        let record = Attendance {
            id: next_id(write_txn, "attendance")?,
            user_id,
            event_name: event_name.trim().to_string(),
            coins,
            created_at: now,
        };
        index.insert(key.as_str(), record.id)?;
        let mut rows = write_txn.open_table(ATTENDANCE)?;
        write_json(&mut rows, record.id, &record)?;

        user.coins = user.coins.saturating_add(coins);
        user.updated_at = now;
        write_json(&mut users, user_id, &user)?;
        Ok(record)
    }

    /// A user's check-ins, newest first.
    pub fn history(&self, user_id: u64) -> StoreResult<Vec<Attendance>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ATTENDANCE)?;
        let mut records = Vec::new();
        for entry in table.iter()?.rev() {
            let (_, value) = entry?;
            let record: Attendance = serde_json::from_slice(value.value())?;
            if record.user_id == user_id {
                records.push(record);
            }
        }
        Ok(records)
    }
}
