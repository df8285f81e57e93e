#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions)]
//
// Strategic lint exceptions - these are allowed project-wide for pragmatic reasons:
//
// Documentation lints: Many internal/self-documenting functions don't need extensive docs.
// Public APIs should still have proper documentation.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Cast safety: casts here convert between unix seconds, u64 ids and calendar
// years, all bounded far below any truncation point.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
//
// Style/complexity: query composition and row mapping naturally run long.
#![allow(clippy::too_many_lines)]
#![allow(clippy::similar_names)]
//
// Low-value pedantic lints that add noise:
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::manual_let_else)]
//
// Return value wrapping: some functions use Result for consistency even when
// they currently can't fail, allowing future error conditions without API breaks.
#![allow(clippy::unnecessary_wraps)]

/// The tweetarchive-core crate version (matches `Cargo.toml`).
pub const TWEETARCHIVE_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod archive;
pub mod constants;
pub mod error;
pub mod hierarchy;
pub mod import;
pub mod index;
pub mod ingest;
pub mod search;
pub mod store;
pub mod types;

pub use archive::TweetArchive;
pub use constants::*;
pub use error::{ArchiveError, Result};
pub use hierarchy::resolve_hierarchy;
pub use import::import_archive;
pub use index::{
    ContentLanguage, IndexSnapshot, PostFields, PostIndex, build_schema, register_analyzers,
};
pub use ingest::{build_post, extract_content, extract_source};
pub use search::{build_keyword_query, parse_expression};
pub use store::PostStore;
pub use types::{
    DeletionNotice, GeoLocation, Post, PostId, ReplyTarget, StatusAuthor, StatusEntities,
    StatusGeo, StatusPlace, StatusUpdate, UrlEntity,
};
