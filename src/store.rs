//! SQLite-backed post store. Source of truth for archived posts.
//!
//! The index is a pure derivative of this table; `raw_data` keeps the
//! original payload so the whole index can be rebuilt by replaying stored
//! payloads through ingestion. The connection sits behind a lock; callers
//! hold it for exactly one statement batch.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::DateTime;
use rusqlite::{Connection, Row, params};

use crate::error::Result;
use crate::types::{GeoLocation, Post, PostId, ReplyTarget};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS posts (
    id                      INTEGER PRIMARY KEY,
    author_id               INTEGER NOT NULL,
    created_at              INTEGER NOT NULL,
    content                 TEXT    NOT NULL,
    source                  TEXT    NOT NULL,
    raw_data                TEXT    NOT NULL,
    in_reply_to_status_id   INTEGER,
    in_reply_to_author_id   INTEGER,
    in_reply_to_screen_name TEXT,
    country_code            TEXT,
    language                TEXT,
    latitude                REAL,
    longitude               REAL
);
CREATE INDEX IF NOT EXISTS idx_posts_reply_target
    ON posts (in_reply_to_status_id);
";

/// Persistent store for [`Post`] records, keyed by id.
pub struct PostStore {
    conn: Mutex<Connection>,
}

impl PostStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_millis(5000))?;
        Self::finish_open(conn)
    }

    /// A volatile in-memory store. Used by tests and tooling.
    pub fn in_memory() -> Result<Self> {
        Self::finish_open(Connection::open_in_memory()?)
    }

    fn finish_open(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes `post`, replacing any previous record with the same id.
    pub fn upsert(&self, post: &Post) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO posts (
                 id, author_id, created_at, content, source, raw_data,
                 in_reply_to_status_id, in_reply_to_author_id, in_reply_to_screen_name,
                 country_code, language, latitude, longitude
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                post.id as i64,
                post.author_id as i64,
                post.created_at.timestamp(),
                post.content,
                post.source,
                post.raw_data,
                post.reply_target.as_ref().map(|r| r.post_id as i64),
                post.reply_target.as_ref().map(|r| r.author_id as i64),
                post.reply_target.as_ref().map(|r| r.screen_name.as_str()),
                post.country_code,
                post.language,
                post.location.as_ref().map(|l| l.latitude),
                post.location.as_ref().map(|l| l.longitude),
            ],
        )?;
        Ok(())
    }

    /// Fetches one post by id.
    pub fn get(&self, id: PostId) -> Result<Option<Post>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, author_id, created_at, content, source, raw_data,
                    in_reply_to_status_id, in_reply_to_author_id, in_reply_to_screen_name,
                    country_code, language, latitude, longitude
             FROM posts WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id as i64], row_to_post)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Fetches posts for `ids`, preserving the input order. Missing ids are
    /// skipped silently (a racing delete is not an error for readers).
    pub fn get_many(&self, ids: &[PostId]) -> Result<Vec<Post>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, author_id, created_at, content, source, raw_data,
                    in_reply_to_status_id, in_reply_to_author_id, in_reply_to_screen_name,
                    country_code, language, latitude, longitude
             FROM posts WHERE id = ?1",
        )?;
        let mut posts = Vec::with_capacity(ids.len());
        for &id in ids {
            let mut rows = stmt.query_map(params![id as i64], row_to_post)?;
            if let Some(row) = rows.next() {
                posts.push(row?);
            }
        }
        Ok(posts)
    }

    /// Deletes the post with `id`. Returns the number of records removed
    /// (zero when the id was unknown).
    pub fn delete(&self, id: PostId) -> Result<u64> {
        let conn = self.lock();
        let count = conn.execute("DELETE FROM posts WHERE id = ?1", params![id as i64])?;
        Ok(count as u64)
    }

    /// One read of the reply-edge relation as a parent → children map.
    /// A single statement, so the result is one consistent snapshot.
    pub fn children_index(&self) -> Result<HashMap<PostId, Vec<PostId>>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, in_reply_to_status_id FROM posts
             WHERE in_reply_to_status_id IS NOT NULL",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)? as PostId, row.get::<_, i64>(1)? as PostId))
        })?;
        let mut children: HashMap<PostId, Vec<PostId>> = HashMap::new();
        for row in rows {
            let (child, parent) = row?;
            children.entry(parent).or_default().push(child);
        }
        Ok(children)
    }

    /// Every stored raw payload, for index rebuilds.
    pub fn all_raw(&self) -> Result<Vec<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT raw_data FROM posts ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut payloads = Vec::new();
        for row in rows {
            payloads.push(row?);
        }
        Ok(payloads)
    }

    /// Number of archived posts.
    pub fn count(&self) -> Result<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn row_to_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let reply_target = match (
        row.get::<_, Option<i64>>(6)?,
        row.get::<_, Option<i64>>(7)?,
        row.get::<_, Option<String>>(8)?,
    ) {
        (Some(post_id), Some(author_id), Some(screen_name)) => Some(ReplyTarget {
            post_id: post_id as PostId,
            author_id: author_id as u64,
            screen_name,
        }),
        _ => None,
    };
    let location = match (
        row.get::<_, Option<f64>>(11)?,
        row.get::<_, Option<f64>>(12)?,
    ) {
        (Some(latitude), Some(longitude)) => Some(GeoLocation {
            latitude,
            longitude,
        }),
        _ => None,
    };
    Ok(Post {
        id: row.get::<_, i64>(0)? as PostId,
        author_id: row.get::<_, i64>(1)? as u64,
        created_at: DateTime::from_timestamp(row.get::<_, i64>(2)?, 0).unwrap_or_default(),
        content: row.get(3)?,
        source: row.get(4)?,
        raw_data: row.get(5)?,
        reply_target,
        country_code: row.get(9)?,
        language: row.get(10)?,
        location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(id: PostId, reply_to: Option<PostId>) -> Post {
        Post {
            id,
            author_id: 7,
            created_at: Utc.with_ymd_and_hms(2016, 9, 5, 12, 0, 0).unwrap(),
            content: format!("post {id}"),
            source: "web".into(),
            raw_data: "{}".into(),
            reply_target: reply_to.map(|post_id| ReplyTarget {
                post_id,
                author_id: 8,
                screen_name: "parent".into(),
            }),
            country_code: Some("de".into()),
            language: Some("de".into()),
            location: Some(GeoLocation {
                latitude: 50.77,
                longitude: 6.08,
            }),
        }
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let store = PostStore::in_memory().unwrap();
        let p = post(1, Some(99));
        store.upsert(&p).unwrap();
        assert_eq!(store.get(1).unwrap(), Some(p));
    }

    #[test]
    fn upsert_replaces_previous_record() {
        let store = PostStore::in_memory().unwrap();
        store.upsert(&post(1, None)).unwrap();
        let mut updated = post(1, None);
        updated.content = "edited".into();
        store.upsert(&updated).unwrap();
        assert_eq!(store.get(1).unwrap().unwrap().content, "edited");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn delete_reports_count_and_is_repeatable() {
        let store = PostStore::in_memory().unwrap();
        store.upsert(&post(1, None)).unwrap();
        assert_eq!(store.delete(1).unwrap(), 1);
        assert_eq!(store.delete(1).unwrap(), 0);
        assert_eq!(store.get(1).unwrap(), None);
    }

    #[test]
    fn get_many_preserves_requested_order() {
        let store = PostStore::in_memory().unwrap();
        for id in [1, 2, 3] {
            store.upsert(&post(id, None)).unwrap();
        }
        let posts = store.get_many(&[3, 1, 4, 2]).unwrap();
        let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn children_index_groups_replies_by_parent() {
        let store = PostStore::in_memory().unwrap();
        store.upsert(&post(1, None)).unwrap();
        store.upsert(&post(2, Some(1))).unwrap();
        store.upsert(&post(3, Some(1))).unwrap();
        store.upsert(&post(4, Some(2))).unwrap();

        let children = store.children_index().unwrap();
        let mut under_root = children.get(&1).cloned().unwrap();
        under_root.sort_unstable();
        assert_eq!(under_root, vec![2, 3]);
        assert_eq!(children.get(&2), Some(&vec![4]));
        assert!(!children.contains_key(&4));
    }
}
