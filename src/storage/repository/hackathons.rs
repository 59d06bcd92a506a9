// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hackathon listings and team applications.
//!
//! Applications are unique per (hackathon, user), enforced through the
//! `hackathon_application_index` table keyed by [`pair_key`].

use chrono::{DateTime, NaiveDate, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::User;
use crate::storage::database::{
    next_id, pair_key, pair_prefix_range, read_json, write_json, Conflict, Database, StoreError,
    StoreResult, HACKATHONS, HACKATHON_APPLICATIONS, HACKATHON_APPLICATION_INDEX, USERS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HackathonStatus {
    Upcoming,
    #[default]
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Hackathon {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: HackathonStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewHackathon {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to `active`
    #[serde(default)]
    pub status: HackathonStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HackathonApplication {
    pub id: u64,
    pub hackathon_id: u64,
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// An application joined with the applicant's user record.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ApplicationWithUser {
    #[serde(flatten)]
    pub application: HackathonApplication,
    pub user: User,
}

pub struct HackathonRepository<'a> {
    db: &'a Database,
}

impl<'a> HackathonRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// List hackathons newest first, optionally filtered by status.
    pub fn list(&self, status: Option<HackathonStatus>) -> StoreResult<Vec<Hackathon>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(HACKATHONS)?;
        let mut hackathons = Vec::new();
        for entry in table.iter()?.rev() {
            let (_, value) = entry?;
            let hackathon: Hackathon = serde_json::from_slice(value.value())?;
            if status.is_none_or(|s| hackathon.status == s) {
                hackathons.push(hackathon);
            }
        }
        Ok(hackathons)
    }

    pub fn get(&self, id: u64) -> StoreResult<Hackathon> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(HACKATHONS)?;
        read_json(&table, id)?.ok_or_else(|| StoreError::NotFound(format!("Hackathon {id}")))
    }

    pub fn create(&self, new: NewHackathon) -> StoreResult<Hackathon> {
        let write_txn = self.db.begin_write()?;
        let hackathon = {
            let hackathon = Hackathon {
                id: next_id(&write_txn, "hackathons")?,
                title: new.title,
                description: new.description,
                status: new.status,
                start_date: new.start_date,
                end_date: new.end_date,
                created_at: Utc::now(),
            };
            let mut table = write_txn.open_table(HACKATHONS)?;
            write_json(&mut table, hackathon.id, &hackathon)?;
            hackathon
        };
        write_txn.commit()?;
        Ok(hackathon)
    }

    /// Delete a hackathon together with all of its applications.
    pub fn delete(&self, id: u64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(HACKATHONS)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        if !removed {
            write_txn.abort()?;
            return Err(StoreError::NotFound(format!("Hackathon {id}")));
        }
        {
            let mut index = write_txn.open_table(HACKATHON_APPLICATION_INDEX)?;
            let mut applications = write_txn.open_table(HACKATHON_APPLICATIONS)?;
            let (start, end) = pair_prefix_range(id);
            let mut doomed = Vec::new();
            for entry in index.range(start.as_str()..end.as_str())? {
                let (key, application_id) = entry?;
                doomed.push((key.value().to_string(), application_id.value()));
            }
            for (key, application_id) in doomed {
                index.remove(key.as_str())?;
                applications.remove(application_id)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Apply to a hackathon. A second application by the same user conflicts.
    pub fn apply(
        &self,
        hackathon_id: u64,
        user_id: u64,
        team_name: Option<String>,
    ) -> StoreResult<HackathonApplication> {
        let write_txn = self.db.begin_write()?;
        let result = Self::apply_in(&write_txn, hackathon_id, user_id, team_name);
        match result {
            Ok(application) => {
                write_txn.commit()?;
                Ok(application)
            }
            Err(e) => {
                write_txn.abort()?;
                Err(e)
            }
        }
    }

    fn apply_in(
        write_txn: &redb::WriteTransaction,
        hackathon_id: u64,
        user_id: u64,
        team_name: Option<String>,
    ) -> StoreResult<HackathonApplication> {
        let hackathons = write_txn.open_table(HACKATHONS)?;
        if hackathons.get(hackathon_id)?.is_none() {
            return Err(StoreError::NotFound(format!("Hackathon {hackathon_id}")));
        }

        let key = pair_key(hackathon_id, user_id);
        let mut index = write_txn.open_table(HACKATHON_APPLICATION_INDEX)?;
        if index.get(key.as_str())?.is_some() {
            return Err(Conflict::DuplicateApplication.into());
        }

        let application = HackathonApplication {
            id: next_id(write_txn, "hackathon_applications")?,
            hackathon_id,
            user_id,
            team_name: team_name.filter(|t| !t.trim().is_empty()),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        };
        index.insert(key.as_str(), application.id)?;
        let mut applications = write_txn.open_table(HACKATHON_APPLICATIONS)?;
        write_json(&mut applications, application.id, &application)?;
        Ok(application)
    }

    /// Applications for a hackathon, oldest first, joined with applicants.
    pub fn applications(&self, hackathon_id: u64) -> StoreResult<Vec<ApplicationWithUser>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(HACKATHON_APPLICATION_INDEX)?;
        let applications = read_txn.open_table(HACKATHON_APPLICATIONS)?;
        let users = read_txn.open_table(USERS)?;

        let (start, end) = pair_prefix_range(hackathon_id);
        let mut joined = Vec::new();
        for entry in index.range(start.as_str()..end.as_str())? {
            let (_, application_id) = entry?;
            let Some(application) =
                read_json::<HackathonApplication>(&applications, application_id.value())?
            else {
                continue;
            };
            if let Some(user) = read_json::<User>(&users, application.user_id)? {
                joined.push(ApplicationWithUser { application, user });
            }
        }
        joined.sort_by_key(|a| a.application.id);
        Ok(joined)
    }
}
