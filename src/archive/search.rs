//! Read paths: keyword search, query-language search, reply hierarchies.

use chrono::NaiveDate;
use tracing::error;

use crate::constants::DEFAULT_SEARCH_LIMIT;
use crate::error::{ArchiveError, Result};
use crate::hierarchy::resolve_hierarchy;
use crate::search::{build_keyword_query, parse_expression};
use crate::types::{Post, PostId};

use super::TweetArchive;

impl TweetArchive {
    /// Searches posts by keywords, optionally bounded to the inclusive
    /// calendar-day range `[from, to]` in UTC. Blank keywords are rejected.
    pub fn search(
        &self,
        keywords: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Post>> {
        let query = build_keyword_query(&self.index, keywords, from, to)?;
        let snapshot = self.index.snapshot();
        let ids = self.index.query(&snapshot, query.as_ref(), DEFAULT_SEARCH_LIMIT)?;
        self.store.get_many(&ids)
    }

    /// Searches posts with a query-language expression.
    ///
    /// A malformed expression is not an error for the caller: the parse
    /// failure is logged and an empty result returned. Leading wildcards
    /// land here too. Only a blank expression is rejected outright.
    pub fn search_by_query(&self, expression: &str) -> Result<Vec<Post>> {
        let query = match parse_expression(&self.index, expression) {
            Ok(query) => query,
            Err(ArchiveError::QueryParse { reason }) => {
                error!(%reason, "could not parse query");
                return Ok(Vec::new());
            }
            Err(other) => return Err(other),
        };
        let snapshot = self.index.snapshot();
        let ids = self.index.query(&snapshot, query.as_ref(), DEFAULT_SEARCH_LIMIT)?;
        self.store.get_many(&ids)
    }

    /// The post with `id` and all transitive replies to it, ordered by
    /// ascending creation time (ties by id). Empty when `id` is unknown.
    pub fn hierarchy(&self, id: PostId) -> Result<Vec<Post>> {
        resolve_hierarchy(&self.store, id)
    }

    /// Id lookup against the store, bypassing the index.
    pub fn get(&self, id: PostId) -> Result<Option<Post>> {
        self.store.get(id)
    }
}
