//! The archived post and its embedded value types.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Externally assigned status id. Unique, never reused.
pub type PostId = u64;

/// Reconstruction data for the post a reply points at.
///
/// Either all three fields are known or the post is not a reply; partial
/// metadata is normalized away at ingestion time and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTarget {
    /// Id of the status this post replies to.
    pub post_id: PostId,
    /// Id of the replied-to author. Not necessarily the account mentioned in
    /// the post text.
    pub author_id: u64,
    /// Screen name of the replied-to author.
    pub screen_name: String,
}

/// Exact location of a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// An archived post. The indexed unit of the whole crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Status id.
    pub id: PostId,
    /// Id of the posting account.
    pub author_id: u64,
    /// UTC creation time, second precision.
    pub created_at: DateTime<Utc>,
    /// Post text with all entities (short urls etc.) resolved to plain urls.
    /// Never blank. The only analyzed field.
    pub content: String,
    /// Client name the post was published with. Label only, no markup.
    pub source: String,
    /// Raw json of the original status payload. Retained so the index can be
    /// rebuilt by replaying stored payloads through ingestion.
    pub raw_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_target: Option<ReplyTarget>,
    /// Country code from the post's place, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// BCP-47-like machine-detected language tag. Drives analyzer selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
}

impl Post {
    /// Calendar year facet, derived from `created_at` at index time.
    #[must_use]
    pub fn year(&self) -> u64 {
        self.created_at.year() as u64
    }

    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.reply_target.is_some()
    }
}
