//! Full-text index over archived posts.
//!
//! Wraps a tantivy index behind the three operations the archive needs:
//! upsert, remove, query. The writer is the single shared mutable resource;
//! it sits behind a lock so concurrent mutations serialize (last writer wins
//! per id). Every mutation commits and reloads the reader before returning,
//! so a snapshot taken afterwards observes it.
//!
//! Queries run against an explicit [`IndexSnapshot`] handle instead of
//! implicit session state; one snapshot is one consistent view.

mod analyzer;
mod schema;

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::Query;
use tantivy::schema::Value;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};

pub use analyzer::{ContentLanguage, register_analyzers};
pub(crate) use analyzer::analyze;
pub use schema::{PostFields, build_schema};

use crate::constants::INDEX_WRITER_HEAP_BYTES;
use crate::error::Result;
use crate::types::{Post, PostId};

/// A consistent read view of the index, valid for one logical operation.
pub struct IndexSnapshot {
    searcher: Searcher,
}

impl IndexSnapshot {
    #[must_use]
    pub fn num_docs(&self) -> u64 {
        self.searcher.num_docs()
    }
}

/// The inverted index over all archived posts.
pub struct PostIndex {
    index: Index,
    fields: PostFields,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
}

impl PostIndex {
    /// Creates a volatile in-memory index. Used by tests and tooling.
    pub fn in_ram() -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        Self::finish_open(index, fields)
    }

    /// Opens (or creates) an index under `dir`.
    pub fn open_in_dir(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let (schema, fields) = build_schema();
        let mmap = MmapDirectory::open(dir).map_err(tantivy::TantivyError::from)?;
        let index = Index::open_or_create(mmap, schema)?;
        Self::finish_open(index, fields)
    }

    fn finish_open(index: Index, fields: PostFields) -> Result<Self> {
        register_analyzers(&index);
        let writer = index.writer(INDEX_WRITER_HEAP_BYTES)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(Self {
            index,
            fields,
            writer: Mutex::new(writer),
            reader,
        })
    }

    #[must_use]
    pub fn fields(&self) -> &PostFields {
        &self.fields
    }

    /// The analyzer registered for `language`, for mirroring query terms.
    pub(crate) fn analyzer_for(&self, language: ContentLanguage) -> tantivy::tokenizer::TextAnalyzer {
        self.index
            .tokenizers()
            .get(language.tokenizer_name())
            .unwrap_or_else(|| language.build_analyzer())
    }

    /// Replaces all postings for `post.id` with freshly derived ones.
    ///
    /// Content goes through the analyzer selected by the post's language tag;
    /// the `year` facet is re-derived from `created_at`. Idempotent under
    /// repeated calls with the same post state.
    pub fn upsert(&self, post: &Post) -> Result<()> {
        let language = ContentLanguage::from_tag(post.language.as_deref());

        let mut doc = TantivyDocument::default();
        doc.add_u64(self.fields.id, post.id);
        doc.add_i64(self.fields.created_at, post.created_at.timestamp());
        doc.add_text(self.fields.content_for(language), &post.content);
        doc.add_text(self.fields.source, &post.source);
        if let Some(country_code) = &post.country_code {
            doc.add_text(self.fields.country_code, country_code);
        }
        if let Some(reply_target) = &post.reply_target {
            doc.add_text(self.fields.replied_to, &reply_target.screen_name);
        }
        doc.add_u64(self.fields.year, post.year());

        let writer = self.lock_writer();
        writer.delete_term(Term::from_field_u64(self.fields.id, post.id));
        writer.add_document(doc)?;
        self.commit(writer)
    }

    /// Deletes all postings for `id`. Removing an unknown id is a no-op.
    pub fn remove(&self, id: PostId) -> Result<()> {
        let writer = self.lock_writer();
        writer.delete_term(Term::from_field_u64(self.fields.id, id));
        self.commit(writer)
    }

    /// Takes a read snapshot reflecting every mutation completed so far.
    pub fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            searcher: self.reader.searcher(),
        }
    }

    /// Evaluates `query` against `snapshot` and returns matching post ids,
    /// best score first. Order is stable for identical index state and query.
    pub fn query(
        &self,
        snapshot: &IndexSnapshot,
        query: &dyn Query,
        limit: usize,
    ) -> Result<Vec<PostId>> {
        let top_docs = snapshot
            .searcher
            .search(query, &TopDocs::with_limit(limit))?;
        let mut ids = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = snapshot.searcher.doc(address)?;
            if let Some(id) = doc.get_first(self.fields.id).and_then(|v| v.as_u64()) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, IndexWriter> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, mut writer: std::sync::MutexGuard<'_, IndexWriter>) -> Result<()> {
        writer.commit()?;
        drop(writer);
        self.reader.reload()?;
        Ok(())
    }
}
