//! Turns incoming status payloads into archived posts.
//!
//! Content extraction resolves url entities to their expanded targets and
//! prefixes retweets the way clients render them. Source extraction strips
//! the html anchor the provider wraps around the client name. Reply metadata
//! is all-or-nothing: a partially populated reply block is dropped rather
//! than stored as a corrupt link.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::types::{GeoLocation, Post, ReplyTarget, StatusUpdate};

/// Pattern the provider wraps client attributions in.
#[allow(clippy::expect_used)]
static SOURCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<a.*?>(.*)</a>$").expect("source pattern compiles"));

/// Builds the archived post for `status`, keeping `raw_json` alongside the
/// derived fields so the index can later be rebuilt from storage alone.
#[must_use]
pub fn build_post(status: &StatusUpdate, raw_json: &str) -> Post {
    Post {
        id: status.id,
        author_id: status.user.id,
        created_at: status.created_at,
        content: extract_content(status),
        source: extract_source(status.source.as_deref()).unwrap_or_default(),
        raw_data: raw_json.to_string(),
        reply_target: extract_reply_target(status),
        country_code: status
            .place
            .as_ref()
            .and_then(|place| place.country_code.clone()),
        language: status.lang.clone(),
        location: status.geo.as_ref().map(|geo| GeoLocation {
            latitude: geo.coordinates[0],
            longitude: geo.coordinates[1],
        }),
    }
}

/// The post text with every url entity replaced by its expanded target.
/// Retweets take the retweeted status's text, prefixed `RT @author: `.
#[must_use]
pub fn extract_content(status: &StatusUpdate) -> String {
    let work = status
        .retweeted_status
        .as_deref()
        .unwrap_or(status);

    let text: Vec<char> = work.text.chars().collect();
    let mut entities = work.entities.urls.clone();
    entities.sort_by_key(|entity| entity.indices[0]);

    let mut content = String::new();
    let mut position = 0usize;
    for entity in &entities {
        let [start, end] = entity.indices;
        if start < position || start > text.len() || end < start {
            // Malformed range; keep the raw text for this span.
            continue;
        }
        content.extend(text[position..start].iter());
        content.push_str(&entity.expanded_url);
        position = end.min(text.len());
    }
    content.extend(text[position..].iter());

    if status.is_retweet() {
        format!("RT @{}: {}", work.user.screen_name, content)
    } else {
        content
    }
}

/// Strips the anchor wrapper from a client attribution. A non-matching but
/// non-blank value passes through trimmed; absent or blank yields `None`.
#[must_use]
pub fn extract_source(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    match SOURCE_PATTERN.captures(trimmed) {
        Some(captures) => Some(captures[1].trim().to_string()),
        None => Some(trimmed.to_string()),
    }
}

/// Reply metadata, only when all three fields are populated.
fn extract_reply_target(status: &StatusUpdate) -> Option<ReplyTarget> {
    match (
        status.in_reply_to_status_id,
        status.in_reply_to_user_id,
        status.in_reply_to_screen_name.as_deref(),
    ) {
        (Some(post_id), Some(author_id), Some(screen_name)) => Some(ReplyTarget {
            post_id,
            author_id,
            screen_name: screen_name.to_string(),
        }),
        (None, None, None) => None,
        _ => {
            warn!(
                status_id = status.id,
                "partial reply metadata, storing without reply linkage"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StatusAuthor, StatusEntities, UrlEntity};
    use chrono::{TimeZone, Utc};

    fn status(text: &str, urls: Vec<UrlEntity>) -> StatusUpdate {
        StatusUpdate {
            id: 1,
            user: StatusAuthor {
                id: 42,
                screen_name: "michael".into(),
            },
            created_at: Utc.with_ymd_and_hms(2016, 9, 5, 12, 0, 0).unwrap(),
            text: text.into(),
            source: None,
            entities: StatusEntities { urls },
            retweeted_status: None,
            in_reply_to_status_id: None,
            in_reply_to_user_id: None,
            in_reply_to_screen_name: None,
            place: None,
            geo: None,
            lang: None,
        }
    }

    #[test]
    fn content_expands_url_entities() {
        let s = status(
            "join us at https://t.co/abc today",
            vec![UrlEntity {
                indices: [11, 30],
                expanded_url: "https://www.euregjug.eu/register/9".into(),
            }],
        );
        assert_eq!(
            extract_content(&s),
            "join us at https://www.euregjug.eu/register/9 today"
        );
    }

    #[test]
    fn retweets_take_the_original_text_with_prefix() {
        let mut outer = status("RT @euregjug: truncated…", vec![]);
        let mut inner = status(
            "Meldet euch zum Vortrag an https://t.co/xyz",
            vec![UrlEntity {
                indices: [27, 43],
                expanded_url: "https://www.euregjug.eu/register/9".into(),
            }],
        );
        inner.user.screen_name = "euregjug".into();
        outer.retweeted_status = Some(Box::new(inner));
        assert_eq!(
            extract_content(&outer),
            "RT @euregjug: Meldet euch zum Vortrag an https://www.euregjug.eu/register/9"
        );
    }

    #[test]
    fn source_strips_the_anchor_wrapper() {
        assert_eq!(
            extract_source(Some(
                "<a href=\"http://www.twitter.com\" rel=\"nofollow\">Twitter for Mac</a>"
            )),
            Some("Twitter for Mac".to_string())
        );
    }

    #[test]
    fn absent_or_blank_source_yields_none() {
        assert_eq!(extract_source(None), None);
        assert_eq!(extract_source(Some("   ")), None);
    }

    #[test]
    fn unwrapped_source_passes_through() {
        assert_eq!(extract_source(Some(" web ")), Some("web".to_string()));
    }

    #[test]
    fn complete_reply_metadata_is_kept() {
        let mut s = status("a reply", vec![]);
        s.in_reply_to_status_id = Some(99);
        s.in_reply_to_user_id = Some(7);
        s.in_reply_to_screen_name = Some("parent".into());
        let post = build_post(&s, "{}");
        assert_eq!(
            post.reply_target,
            Some(ReplyTarget {
                post_id: 99,
                author_id: 7,
                screen_name: "parent".into()
            })
        );
    }

    #[test]
    fn partial_reply_metadata_is_dropped() {
        let mut s = status("a reply", vec![]);
        s.in_reply_to_status_id = Some(99);
        let post = build_post(&s, "{}");
        assert_eq!(post.reply_target, None);
    }
}
