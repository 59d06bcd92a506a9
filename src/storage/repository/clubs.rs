// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Clubs and club membership.
//!
//! Memberships live in `club_members` keyed by [`pair_key`]`(club, user)`.
//! Joining twice and leaving a club one never joined are both no-ops.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::database::{
    next_id, pair_key, pair_prefix_range, read_json, write_json, Database, StoreError,
    StoreResult, CLUBS, CLUB_MEMBERS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Club {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Free-form meeting schedule, e.g. "Tue 18:00"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewClub {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
}

/// A club as seen by a particular caller.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClubView {
    #[serde(flatten)]
    pub club: Club,
    pub member_count: u64,
    pub is_member: bool,
}

pub struct ClubRepository<'a> {
    db: &'a Database,
}

impl<'a> ClubRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All clubs in creation order with membership info for `viewer`.
    pub fn list(&self, viewer: u64) -> StoreResult<Vec<ClubView>> {
        let read_txn = self.db.begin_read()?;
        let clubs = read_txn.open_table(CLUBS)?;
        let members = read_txn.open_table(CLUB_MEMBERS)?;

        let mut views = Vec::new();
        for entry in clubs.iter()? {
            let (_, value) = entry?;
            let club: Club = serde_json::from_slice(value.value())?;
            views.push(Self::view(&members, club, viewer)?);
        }
        Ok(views)
    }

    pub fn get(&self, id: u64, viewer: u64) -> StoreResult<ClubView> {
        let read_txn = self.db.begin_read()?;
        let clubs = read_txn.open_table(CLUBS)?;
        let members = read_txn.open_table(CLUB_MEMBERS)?;
        let club: Club =
            read_json(&clubs, id)?.ok_or_else(|| StoreError::NotFound(format!("Club {id}")))?;
        Self::view(&members, club, viewer)
    }

    fn view(
        members: &impl ReadableTable<&'static str, i64>,
        club: Club,
        viewer: u64,
    ) -> StoreResult<ClubView> {
        let (start, end) = pair_prefix_range(club.id);
        let mut member_count = 0;
        for entry in members.range(start.as_str()..end.as_str())? {
            entry?;
            member_count += 1;
        }
        let is_member = members.get(pair_key(club.id, viewer).as_str())?.is_some();
        Ok(ClubView {
            club,
            member_count,
            is_member,
        })
    }

    pub fn create(&self, new: NewClub) -> StoreResult<Club> {
        let write_txn = self.db.begin_write()?;
        let club = {
            let club = Club {
                id: next_id(&write_txn, "clubs")?,
                name: new.name,
                description: new.description,
                image_url: new.image_url,
                schedule: new.schedule,
                created_at: Utc::now(),
            };
            let mut table = write_txn.open_table(CLUBS)?;
            write_json(&mut table, club.id, &club)?;
            club
        };
        write_txn.commit()?;
        Ok(club)
    }

    /// Delete a club and every membership in it.
    pub fn delete(&self, id: u64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut clubs = write_txn.open_table(CLUBS)?;
            let removed = clubs.remove(id)?.is_some();
            removed
        };
        if !removed {
            write_txn.abort()?;
            return Err(StoreError::NotFound(format!("Club {id}")));
        }
        {
            let mut members = write_txn.open_table(CLUB_MEMBERS)?;
            let (start, end) = pair_prefix_range(id);
            let mut keys = Vec::new();
            for entry in members.range(start.as_str()..end.as_str())? {
                let (key, _) = entry?;
                keys.push(key.value().to_string());
            }
            for key in keys {
                members.remove(key.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Add `user_id` to the club. Returns `false` if already a member.
    pub fn join(&self, club_id: u64, user_id: u64) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let joined = {
            let clubs = write_txn.open_table(CLUBS)?;
            if clubs.get(club_id)?.is_none() {
                drop(clubs);
                write_txn.abort()?;
                return Err(StoreError::NotFound(format!("Club {club_id}")));
            }
            let mut members = write_txn.open_table(CLUB_MEMBERS)?;
            let key = pair_key(club_id, user_id);
            let exists = members.get(key.as_str())?.is_some();
            if !exists {
                members.insert(key.as_str(), Utc::now().timestamp())?;
            }
            !exists
        };
        write_txn.commit()?;
        Ok(joined)
    }

    /// Remove `user_id` from the club. Returns `false` if not a member.
    pub fn leave(&self, club_id: u64, user_id: u64) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let left = {
            let mut members = write_txn.open_table(CLUB_MEMBERS)?;
            let left = members.remove(pair_key(club_id, user_id).as_str())?.is_some();
            left
        };
        write_txn.commit()?;
        Ok(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::tests::temp_db;

    fn new_club(name: &str) -> NewClub {
        NewClub {
            name: name.into(),
            description: String::new(),
            image_url: None,
            schedule: Some("Fri 17:00".into()),
        }
    }

    #[test]
    fn join_and_leave_are_idempotent() {
        let (db, _dir) = temp_db();
        let repo = ClubRepository::new(&db);
        let club = repo.create(new_club("Chess")).unwrap();

        assert!(repo.join(club.id, 1).unwrap());
        assert!(!repo.join(club.id, 1).unwrap());
        repo.join(club.id, 2).unwrap();

        let view = repo.get(club.id, 1).unwrap();
        assert_eq!(view.member_count, 2);
        assert!(view.is_member);
        assert!(!repo.get(club.id, 3).unwrap().is_member);

        assert!(repo.leave(club.id, 1).unwrap());
        assert!(!repo.leave(club.id, 1).unwrap());
        assert_eq!(repo.get(club.id, 1).unwrap().member_count, 1);
    }

    #[test]
    fn member_counts_do_not_leak_between_clubs() {
        let (db, _dir) = temp_db();
        let repo = ClubRepository::new(&db);
        let chess = repo.create(new_club("Chess")).unwrap();
        let robots = repo.create(new_club("Robotics")).unwrap();
        repo.join(chess.id, 1).unwrap();

        let views = repo.list(1).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].club.id, chess.id);
        assert_eq!(views[0].member_count, 1);
        assert_eq!(views[1].club.id, robots.id);
        assert_eq!(views[1].member_count, 0);
        assert!(!views[1].is_member);
    }

    #[test]
    fn join_missing_club_is_not_found() {
        let (db, _dir) = temp_db();
        let repo = ClubRepository::new(&db);
        assert!(matches!(repo.join(9, 1), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_removes_memberships() {
        let (db, _dir) = temp_db();
        let repo = ClubRepository::new(&db);
        let club = repo.create(new_club("Chess")).unwrap();
        repo.join(club.id, 1).unwrap();

        repo.delete(club.id).unwrap();

        assert!(matches!(repo.get(club.id, 1), Err(StoreError::NotFound(_))));
        let read_txn = db.begin_read().unwrap();
        let members = read_txn.open_table(CLUB_MEMBERS).unwrap();
        assert_eq!(members.iter().unwrap().count(), 0);
    }
}
