//! Tuning constants shared across the crate.

/// Heap budget handed to the tantivy index writer.
pub const INDEX_WRITER_HEAP_BYTES: usize = 50_000_000;

/// Upper bound on hits collected for a single search.
pub const DEFAULT_SEARCH_LIMIT: usize = 1_000;

/// Tokens longer than this are dropped during analysis.
pub const MAX_TOKEN_LENGTH: usize = 40;
