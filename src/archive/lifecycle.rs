//! Opening and creating archives.

use std::path::Path;

use crate::error::Result;
use crate::index::PostIndex;
use crate::store::PostStore;

use super::TweetArchive;

impl TweetArchive {
    /// Opens (or creates) an archive under `dir`: the store at
    /// `archive.db`, the index under `index/`.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let store = PostStore::open(&dir.join("archive.db"))?;
        let index = PostIndex::open_in_dir(&dir.join("index"))?;
        Ok(Self { store, index })
    }

    /// A volatile archive, store and index both in memory. Used by tests
    /// and tooling.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            store: PostStore::in_memory()?,
            index: PostIndex::in_ram()?,
        })
    }

    /// Number of archived posts.
    pub fn len(&self) -> Result<u64> {
        self.store.count()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
