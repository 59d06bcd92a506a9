// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Student government roster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::database::{
    next_id, scan_json, write_json, Database, StoreError, StoreResult, GOV_MEMBERS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GovMember {
    pub id: u64,
    pub name: String,
    /// Position held, e.g. "President"
    pub role_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewGovMember {
    pub name: String,
    pub role_title: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub contact_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

pub struct GovRepository<'a> {
    db: &'a Database,
}

impl<'a> GovRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Members ordered by display order, then id.
    pub fn list(&self) -> StoreResult<Vec<GovMember>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(GOV_MEMBERS)?;
        let mut members: Vec<GovMember> = scan_json(&table)?;
        members.sort_by_key(|m| (m.display_order, m.id));
        Ok(members)
    }

    pub fn create(&self, new: NewGovMember) -> StoreResult<GovMember> {
        let write_txn = self.db.begin_write()?;
        let member = {
            let member = GovMember {
                id: next_id(&write_txn, "gov_members")?,
                name: new.name,
                role_title: new.role_title,
                photo_url: new.photo_url,
                contact_url: new.contact_url,
                display_order: new.display_order,
                created_at: Utc::now(),
            };
            let mut table = write_txn.open_table(GOV_MEMBERS)?;
            write_json(&mut table, member.id, &member)?;
            member
        };
        write_txn.commit()?;
        Ok(member)
    }

    pub fn delete(&self, id: u64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(GOV_MEMBERS)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        if !removed {
            write_txn.abort()?;
            return Err(StoreError::NotFound(format!("Government member {id}")));
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::tests::temp_db;

    fn member(name: &str, display_order: i32) -> NewGovMember {
        NewGovMember {
            name: name.into(),
            role_title: "Member".into(),
            photo_url: None,
            contact_url: None,
            display_order,
        }
    }

    #[test]
    fn list_orders_by_display_order_then_id() {
        let (db, _dir) = temp_db();
        let repo = GovRepository::new(&db);
        repo.create(member("Treasurer", 2)).unwrap();
        repo.create(member("President", 0)).unwrap();
        repo.create(member("Secretary", 2)).unwrap();

        let names: Vec<_> = repo.list().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["President", "Treasurer", "Secretary"]);
    }

    #[test]
    fn delete_missing_member_is_not_found() {
        let (db, _dir) = temp_db();
        let repo = GovRepository::new(&db);
        let m = repo.create(member("President", 0)).unwrap();
        repo.delete(m.id).unwrap();
        assert!(matches!(repo.delete(m.id), Err(StoreError::NotFound(_))));
    }
}
