//! Write paths: storing statuses, deleting them, rebuilding the index.
//!
//! Ordering per operation: the store write lands first, then the index is
//! brought in line and committed before the call returns. A search issued
//! after `store_status` returns therefore observes the new post. Mutations
//! for the same id serialize on the writer lock (last writer wins).

use tracing::{debug, info};

use crate::error::Result;
use crate::ingest::build_post;
use crate::types::{DeletionNotice, Post, PostId, StatusUpdate};

use super::TweetArchive;

impl TweetArchive {
    /// Archives a status delivered by the ingestion collaborator. The raw
    /// payload is persisted verbatim next to the derived fields.
    pub fn store_status(&self, status: &StatusUpdate, raw_json: &str) -> Result<Post> {
        let post = build_post(status, raw_json);
        self.store.upsert(&post)?;
        self.index.upsert(&post)?;
        debug!(post_id = post.id, "archived status");
        Ok(post)
    }

    /// Handles a deletion notice. Returns the number of records removed;
    /// deleting an unknown id is a no-op reported as zero.
    pub fn delete(&self, id: PostId) -> Result<u64> {
        let count = self.store.delete(id)?;
        self.index.remove(id)?;
        info!("Deleted {count} status...");
        Ok(count)
    }

    /// Handles a deletion notice from the ingestion collaborator.
    pub fn handle_deletion(&self, notice: &DeletionNotice) -> Result<u64> {
        self.delete(notice.id)
    }

    /// Rebuilds the index by replaying every stored raw payload through
    /// ingestion and the analysis pipeline. No external re-fetch involved.
    pub fn reindex(&self) -> Result<u64> {
        let mut replayed = 0u64;
        for raw in self.store.all_raw()? {
            let status: StatusUpdate = serde_json::from_str(&raw)?;
            let post = build_post(&status, &raw);
            self.index.upsert(&post)?;
            replayed += 1;
        }
        info!(replayed, "reindexed archive from stored payloads");
        Ok(replayed)
    }
}
