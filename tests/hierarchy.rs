//! Integration tests for reply-tree reconstruction.

use chrono::{DateTime, TimeZone, Utc};
use tweetarchive_core::{StatusAuthor, StatusEntities, StatusUpdate, TweetArchive};

fn status(
    id: u64,
    created_at: DateTime<Utc>,
    text: &str,
    reply_to: Option<u64>,
) -> StatusUpdate {
    StatusUpdate {
        id,
        user: StatusAuthor {
            id: 42,
            screen_name: "archivist".into(),
        },
        created_at,
        text: text.into(),
        source: Some("<a href=\"https://about.twitter.com\">Twitter Web Client</a>".into()),
        entities: StatusEntities::default(),
        retweeted_status: None,
        in_reply_to_status_id: reply_to,
        in_reply_to_user_id: reply_to.map(|_| 42),
        in_reply_to_screen_name: reply_to.map(|_| "archivist".to_string()),
        place: None,
        geo: None,
        lang: None,
    }
}

fn store(archive: &TweetArchive, status: &StatusUpdate) {
    let raw = serde_json::to_string(status).unwrap();
    archive.store_status(status, &raw).unwrap();
}

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 12, 27, 8, minute, 0).unwrap()
}

#[test]
fn hierarchy_is_ordered_by_creation_time() {
    let archive = TweetArchive::in_memory().unwrap();
    // A (root), B replies to A, C replies to B, D replies to A.
    store(&archive, &status(1, at(0), "root", None));
    store(&archive, &status(2, at(1), "first reply", Some(1)));
    store(&archive, &status(3, at(3), "reply to the reply", Some(2)));
    store(&archive, &status(4, at(2), "second reply", Some(1)));

    let posts = archive.hierarchy(1).unwrap();
    let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 3]);
}

#[test]
fn timestamp_ties_break_by_id() {
    let archive = TweetArchive::in_memory().unwrap();
    store(&archive, &status(1, at(0), "root", None));
    store(&archive, &status(9, at(1), "tied reply", Some(1)));
    store(&archive, &status(5, at(1), "tied reply", Some(1)));

    let posts = archive.hierarchy(1).unwrap();
    let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 5, 9]);
}

#[test]
fn unrelated_posts_stay_out_of_the_tree() {
    let archive = TweetArchive::in_memory().unwrap();
    store(&archive, &status(1, at(0), "root", None));
    store(&archive, &status(2, at(1), "reply", Some(1)));
    store(&archive, &status(3, at(2), "other root", None));
    store(&archive, &status(4, at(3), "other reply", Some(3)));

    let posts = archive.hierarchy(1).unwrap();
    let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn missing_root_yields_an_empty_tree() {
    let archive = TweetArchive::in_memory().unwrap();
    store(&archive, &status(1, at(0), "root", None));
    assert!(archive.hierarchy(999).unwrap().is_empty());
}

#[test]
fn cyclic_reply_data_terminates_with_each_post_once() {
    let archive = TweetArchive::in_memory().unwrap();
    // Malformed data: X and Y each reply to the other.
    store(&archive, &status(1, at(0), "x", Some(2)));
    store(&archive, &status(2, at(1), "y", Some(1)));

    let posts = archive.hierarchy(1).unwrap();
    let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn deleted_replies_drop_out_of_the_tree() {
    let archive = TweetArchive::in_memory().unwrap();
    store(&archive, &status(1, at(0), "root", None));
    store(&archive, &status(2, at(1), "reply", Some(1)));
    archive.delete(2).unwrap();

    let posts = archive.hierarchy(1).unwrap();
    let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1]);
}
