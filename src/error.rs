//! Error type and result alias for the archive core.

use thiserror::Error;

/// All failure modes surfaced by this crate.
///
/// Query-language parse failures (`QueryParse`) are recovered inside
/// [`crate::TweetArchive::search_by_query`]; everything else is fatal for the
/// in-flight operation and propagates to the caller. Retrying belongs to the
/// caller, never to this crate.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A required request parameter was blank or malformed. Rejected before
    /// any index or store work happens.
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// The query-language expression could not be parsed.
    #[error("could not parse query expression: {reason}")]
    QueryParse { reason: String },

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Index(#[from] tantivy::TantivyError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl ArchiveError {
    pub(crate) fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            reason: reason.into(),
        }
    }

    pub(crate) fn query_parse(reason: impl Into<String>) -> Self {
        Self::QueryParse {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
