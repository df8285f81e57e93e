//! The archive facade: one handle owning the store and the index.
//!
//! Split by concern: `lifecycle` (open/create), `mutation`
//! (store/delete/reindex), `search` (the three read operations). All methods
//! take `&self`; the store connection and the index writer carry their own
//! locks, so concurrent requests serialize only where they must.

mod lifecycle;
mod mutation;
mod search;

use crate::index::PostIndex;
use crate::store::PostStore;

/// A single-node tweet archive: SQLite store of record plus a tantivy
/// full-text index derived from it.
pub struct TweetArchive {
    store: PostStore,
    index: PostIndex,
}

impl TweetArchive {
    /// The backing store. Read paths that bypass full-text search (the
    /// hierarchy resolver, id lookups) go through here.
    #[must_use]
    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// The full-text index.
    #[must_use]
    pub fn index(&self) -> &PostIndex {
        &self.index
    }
}
