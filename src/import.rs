//! Bulk import of a provider archive export (zip of json chunks).
//!
//! The export's tweet files differ from the live api in two ways this module
//! undoes before replaying them through normal ingestion: each file opens
//! with a javascript assignment line, and `created_at` values use
//! `yyyy-MM-dd HH:mm:ss +0000` instead of the api's day-of-week format. The
//! `sizes` objects are arrays in the export and collapse to `{}`. Date
//! parsing and formatting happen per call; nothing here shares formatter
//! state across threads.

use std::io::{Read, Seek};

use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::archive::TweetArchive;
use crate::error::Result;
use crate::types::{StatusUpdate, twitter_date};

const TWEET_ENTRY_PREFIX: &str = "data/js/tweets/";
const ARCHIVE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

#[allow(clippy::expect_used)]
static CREATED_AT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("created_at" : )"(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} \+\d{4})""#)
        .expect("created_at pattern compiles")
});

#[allow(clippy::expect_used)]
static SIZES_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""sizes" : \[.+?\],"#).expect("sizes pattern compiles"));

/// Imports every tweet file from the export zip into `archive`, one status
/// at a time, raw payload retained per status. Returns the number of
/// statuses imported.
pub fn import_archive<R: Read + Seek>(archive: &TweetArchive, reader: R) -> Result<u64> {
    let mut zip = zip::ZipArchive::new(reader)?;
    let mut imported = 0u64;
    for entry_index in 0..zip.len() {
        let mut entry = zip.by_index(entry_index)?;
        if !entry.name().starts_with(TWEET_ENTRY_PREFIX) || entry.is_dir() {
            continue;
        }
        debug!(entry = entry.name(), "reading archive entry");

        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        let statuses: Vec<serde_json::Value> = serde_json::from_str(&reformat_entry(&content))?;
        for raw in statuses {
            let status: StatusUpdate = serde_json::from_value(raw.clone())?;
            archive.store_status(&status, &raw.to_string())?;
            imported += 1;
        }
    }
    Ok(imported)
}

/// Rewrites one export file into parseable api-shaped json: drops the
/// assignment preamble, rewrites `created_at` values, collapses `sizes`.
fn reformat_entry(content: &str) -> String {
    let joined: String = content
        .lines()
        .skip(1)
        .map(rewrite_created_at)
        .collect::<Vec<_>>()
        .join("");
    SIZES_PATTERN
        .replace_all(&joined, "\"sizes\" : {},")
        .into_owned()
}

/// Rewrites the first export-format `created_at` on a line into api format.
/// An unparseable date keeps the line untouched.
fn rewrite_created_at(line: &str) -> String {
    CREATED_AT_PATTERN
        .replace(line, |captures: &Captures<'_>| {
            match DateTime::parse_from_str(&captures[2], ARCHIVE_DATE_FORMAT) {
                Ok(parsed) => format!(
                    "{}\"{}\"",
                    &captures[1],
                    parsed.format(twitter_date::FORMAT)
                ),
                Err(err) => {
                    warn!(%err, "unexpected date format in archive");
                    captures[0].to_string()
                }
            }
        })
        .into_owned()
}
