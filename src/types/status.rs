//! Incoming status payloads as delivered by the ingestion collaborator.
//!
//! The shapes follow the provider's json wire format closely enough that a
//! raw payload deserializes directly; ingestion (`crate::ingest`) turns a
//! [`StatusUpdate`] into a [`crate::Post`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serde adapter for the provider's `created_at` format
/// (`Tue Sep 05 22:51:24 +0000 2012`). Parsing and formatting happen per
/// call; there is no shared formatter state.
pub mod twitter_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub const FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_str(&raw, FORMAT)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

/// The account behind a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAuthor {
    pub id: u64,
    pub screen_name: String,
}

/// A url entity: the code-point range it occupies in the text plus the
/// resolved target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEntity {
    /// `[start, end)` in code points, as the provider counts them.
    pub indices: [usize; 2],
    pub expanded_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
}

/// Place metadata; only the country code survives into the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPlace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// Point geometry, `[latitude, longitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusGeo {
    pub coordinates: [f64; 2],
}

/// A status as delivered on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub id: u64,
    pub user: StatusAuthor,
    #[serde(with = "twitter_date")]
    pub created_at: DateTime<Utc>,
    pub text: String,
    /// Client attribution as an html anchor, e.g.
    /// `<a href="...">Twitter for Mac</a>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub entities: StatusEntities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<Box<StatusUpdate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_status_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_screen_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<StatusPlace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<StatusGeo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl StatusUpdate {
    #[must_use]
    pub fn is_retweet(&self) -> bool {
        self.retweeted_status.is_some()
    }
}

/// A deletion notice for a previously delivered status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionNotice {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn created_at_parses_provider_format() {
        let json = r#"{
            "id": 772772372990586882,
            "user": {"id": 42, "screen_name": "michael"},
            "created_at": "Mon Sep 05 12:34:56 +0000 2016",
            "text": "hello world"
        }"#;
        let status: StatusUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(
            status.created_at,
            Utc.with_ymd_and_hms(2016, 9, 5, 12, 34, 56).unwrap()
        );
        assert!(status.entities.urls.is_empty());
        assert!(!status.is_retweet());
    }

    #[test]
    fn created_at_round_trips() {
        let ts = Utc.with_ymd_and_hms(2016, 12, 27, 8, 0, 0).unwrap();
        let formatted = ts.format(twitter_date::FORMAT).to_string();
        let parsed = DateTime::parse_from_str(&formatted, twitter_date::FORMAT).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), ts);
    }
}
