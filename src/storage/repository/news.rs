// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! News feed repository.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::database::{
    next_id, read_json, write_json, Database, StoreError, StoreResult, NEWS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct News {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Admin who published the post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of a news post.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewsInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

pub struct NewsRepository<'a> {
    db: &'a Database,
}

impl<'a> NewsRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// List posts newest first, optionally filtered by tag.
    pub fn list(&self, tag: Option<&str>) -> StoreResult<Vec<News>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NEWS)?;
        let mut posts = Vec::new();
        for entry in table.iter()?.rev() {
            let (_, value) = entry?;
            let post: News = serde_json::from_slice(value.value())?;
            if tag.is_none_or(|t| post.tag.as_deref() == Some(t)) {
                posts.push(post);
            }
        }
        Ok(posts)
    }

    pub fn get(&self, id: u64) -> StoreResult<News> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NEWS)?;
        read_json(&table, id)?.ok_or_else(|| StoreError::NotFound(format!("News {id}")))
    }

    pub fn create(&self, input: NewsInput, author_id: Option<u64>) -> StoreResult<News> {
        let now = Utc::now();
        let write_txn = self.db.begin_write()?;
        let post = {
            let post = News {
                id: next_id(&write_txn, "news")?,
                title: input.title,
                content: input.content,
                image_url: input.image_url,
                tag: input.tag,
                author_id,
                created_at: now,
                updated_at: now,
            };
            let mut table = write_txn.open_table(NEWS)?;
            write_json(&mut table, post.id, &post)?;
            post
        };
        write_txn.commit()?;
        Ok(post)
    }

    pub fn update(&self, id: u64, input: NewsInput) -> StoreResult<News> {
        let write_txn = self.db.begin_write()?;
        let post = {
            let mut table = write_txn.open_table(NEWS)?;
            let Some(mut post) = read_json::<News>(&table, id)? else {
                drop(table);
                write_txn.abort()?;
                return Err(StoreError::NotFound(format!("News {id}")));
            };
            post.title = input.title;
            post.content = input.content;
            post.image_url = input.image_url;
            post.tag = input.tag;
            post.updated_at = Utc::now();
            write_json(&mut table, id, &post)?;
            post
        };
        write_txn.commit()?;
        Ok(post)
    }

    pub fn delete(&self, id: u64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(NEWS)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        if !removed {
            write_txn.abort()?;
            return Err(StoreError::NotFound(format!("News {id}")));
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::tests::temp_db;

    fn input(title: &str, tag: Option<&str>) -> NewsInput {
        NewsInput {
            title: title.into(),
            content: "body".into(),
            image_url: None,
            tag: tag.map(str::to_string),
        }
    }

    #[test]
    fn list_is_newest_first_and_filters_by_tag() {
        let (db, _dir) = temp_db();
        let repo = NewsRepository::new(&db);
        repo.create(input("first", Some("events")), None).unwrap();
        repo.create(input("second", Some("school")), None).unwrap();
        repo.create(input("third", Some("events")), Some(1)).unwrap();

        let titles: Vec<_> = repo.list(None).unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);

        let events = repo.list(Some("events")).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|n| n.tag.as_deref() == Some("events")));
    }

    #[test]
    fn update_and_delete() {
        let (db, _dir) = temp_db();
        let repo = NewsRepository::new(&db);
        let post = repo.create(input("draft", None), None).unwrap();

        let updated = repo.update(post.id, input("final", Some("school"))).unwrap();
        assert_eq!(updated.title, "final");
        assert_eq!(updated.created_at, post.created_at);
        assert_eq!(repo.get(post.id).unwrap().tag.as_deref(), Some("school"));

        repo.delete(post.id).unwrap();
        assert!(matches!(repo.get(post.id), Err(StoreError::NotFound(_))));
        assert!(matches!(repo.update(post.id, input("x", None)), Err(StoreError::NotFound(_))));
    }
}
