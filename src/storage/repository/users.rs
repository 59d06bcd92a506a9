// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User directory.
//!
//! Maps a Telegram identity to an internal user record. The
//! `users_by_telegram` index is the uniqueness constraint: every lookup and
//! insert on it happens inside a single write transaction, so concurrent first
//! logins for the same Telegram id always resolve to one row.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Role, TelegramUser};
use crate::storage::database::{
    next_id, read_json, scan_json, write_json, Database, StoreError, StoreResult, USERS,
    USERS_BY_TELEGRAM,
};

/// A registered platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Internal surrogate id
    pub id: u64,
    /// Telegram numeric id (unique, immutable)
    pub telegram_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub role: Role,
    /// Login on the school platform, set by school verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_login: Option<String>,
    #[serde(default)]
    pub school_level: u32,
    #[serde(default)]
    pub school_xp: u64,
    #[serde(default)]
    pub audit_ratio: f64,
    /// Coin balance
    #[serde(default)]
    pub coins: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    fn from_claim(id: u64, claim: &TelegramUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            telegram_id: claim.id,
            username: claim.username.clone(),
            first_name: claim.first_name.clone(),
            last_name: claim.last_name.clone(),
            photo_url: claim.photo_url.clone(),
            role: Role::Guest,
            school_login: None,
            school_level: 0,
            school_xp: 0,
            audit_ratio: 0.0,
            coins: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh display fields from a fresh claim. Role and balances are untouched.
    fn refresh_profile(&mut self, claim: &TelegramUser, now: DateTime<Utc>) {
        self.username = claim.username.clone();
        self.first_name = claim.first_name.clone();
        self.last_name = claim.last_name.clone();
        self.photo_url = claim.photo_url.clone();
        self.updated_at = now;
    }
}

/// Facts confirmed by the school platform.
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolData {
    pub login: String,
    pub level: u32,
    pub xp: u64,
    pub audit_ratio: f64,
}

/// Repository for user records.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a user by internal id.
    pub fn get(&self, user_id: u64) -> StoreResult<User> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        read_json(&table, user_id)?.ok_or_else(|| StoreError::NotFound(format!("User {user_id}")))
    }

    /// Look up a user by Telegram id.
    pub fn find_by_telegram_id(&self, telegram_id: i64) -> StoreResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USERS_BY_TELEGRAM)?;
        let Some(user_id) = index.get(telegram_id)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let table = read_txn.open_table(USERS)?;
        read_json(&table, user_id)
    }

    /// Insert or refresh the user for a verified Telegram claim.
    ///
    /// Existing users keep their role, balances and school data; only the
    /// display fields are refreshed. New users start as [`Role::Guest`].
    pub fn upsert_telegram(&self, claim: &TelegramUser) -> StoreResult<User> {
        let now = Utc::now();
        let write_txn = self.db.begin_write()?;
        let user = {
            let mut index = write_txn.open_table(USERS_BY_TELEGRAM)?;
            let mut table = write_txn.open_table(USERS)?;

            let existing_id = index.get(claim.id)?.map(|v| v.value());
            let existing: Option<User> = match existing_id {
                Some(id) => read_json(&table, id)?,
                None => None,
            };

            let user = match existing {
                Some(mut user) => {
                    user.refresh_profile(claim, now);
                    user
                }
                None => {
                    let id = next_id(&write_txn, "users")?;
                    index.insert(claim.id, id)?;
                    User::from_claim(id, claim, now)
                }
            };
            write_json(&mut table, user.id, &user)?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Store school verification results and escalate the role to at least
    /// [`Role::Student`].
    pub fn update_school_data(&self, user_id: u64, data: &SchoolData) -> StoreResult<User> {
        self.modify(user_id, |user| {
            user.school_login = Some(data.login.clone());
            user.school_level = data.level;
            user.school_xp = data.xp;
            user.audit_ratio = data.audit_ratio;
            user.role = user.role.escalate(Role::Student);
        })
    }

    /// Raise a user's role. A lower target leaves the role unchanged.
    pub fn escalate_role(&self, user_id: u64, role: Role) -> StoreResult<User> {
        self.modify(user_id, |user| user.role = user.role.escalate(role))
    }

    /// Users ordered by coin balance, richest first. Ties go to the older account.
    pub fn leaderboard(&self, limit: usize) -> StoreResult<Vec<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        let mut users: Vec<User> = scan_json(&table)?;
        users.sort_by(|a, b| b.coins.cmp(&a.coins).then(a.id.cmp(&b.id)));
        users.truncate(limit);
        Ok(users)
    }

    /// Every known Telegram id, for broadcasts.
    pub fn telegram_ids(&self) -> StoreResult<Vec<i64>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USERS_BY_TELEGRAM)?;
        let mut ids = Vec::new();
        for entry in index.iter()? {
            let (telegram_id, _) = entry?;
            ids.push(telegram_id.value());
        }
        Ok(ids)
    }

    fn modify(&self, user_id: u64, apply: impl FnOnce(&mut User)) -> StoreResult<User> {
        let write_txn = self.db.begin_write()?;
        let user = {
            let mut table = write_txn.open_table(USERS)?;
            let mut user: User = read_json(&table, user_id)?
                .ok_or_else(|| StoreError::NotFound(format!("User {user_id}")))?;
            apply(&mut user);
            user.updated_at = Utc::now();
            write_json(&mut table, user_id, &user)?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }
}
