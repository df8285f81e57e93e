//! Keyword search with an optional calendar date range.
//!
//! Composition: one mandatory keyword clause over the content fields, plus a
//! mandatory range clause per present date bound, all conjoined. `from` is
//! the inclusive UTC midnight of that day; `to` is an inclusive calendar day,
//! realized as an exclusive bound at midnight of the following day.

use std::ops::Bound::{Excluded, Included, Unbounded};

use chrono::{Days, NaiveDate, NaiveTime};
use tantivy::Term;
use tantivy::query::{BooleanQuery, Occur, Query, RangeQuery, TermQuery};
use tantivy::schema::IndexRecordOption;

use crate::error::{ArchiveError, Result};
use crate::index::{PostIndex, analyze};

/// Builds the boolean query for a keyword search over `[from, to]`.
///
/// `keywords` is analyzed per content field; the resulting terms are OR-ed
/// within the keyword clause (any matching term qualifies a post). Blank
/// keywords are rejected before any index work happens.
pub fn build_keyword_query(
    index: &PostIndex,
    keywords: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Box<dyn Query>> {
    if keywords.trim().is_empty() {
        return Err(ArchiveError::invalid_query(
            "search keywords must not be blank",
        ));
    }

    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    clauses.push((Occur::Must, keyword_clause(index, keywords)));

    if let Some(from) = from {
        let lower = Included(created_at_term(index, from));
        clauses.push((
            Occur::Must,
            Box::new(RangeQuery::new(lower, Unbounded)),
        ));
    }
    if let Some(to) = to {
        // Inclusive day: exclusive bound at midnight of the day after.
        let upper = match to.checked_add_days(Days::new(1)) {
            Some(next_day) => Excluded(created_at_term(index, next_day)),
            None => Unbounded,
        };
        clauses.push((
            Occur::Must,
            Box::new(RangeQuery::new(Unbounded, upper)),
        ));
    }

    Ok(Box::new(BooleanQuery::new(clauses)))
}

/// The mandatory keyword clause: every analyzed term of `keywords`, across
/// every content field, as a should-composed boolean.
fn keyword_clause(index: &PostIndex, keywords: &str) -> Box<dyn Query> {
    let mut terms: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    for (language, field) in index.fields().content_fields() {
        let mut analyzer = index.analyzer_for(language);
        for token in analyze(&mut analyzer, keywords) {
            let term = Term::from_field_text(field, &token);
            terms.push((
                Occur::Should,
                Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)),
            ));
        }
    }
    // No analyzable tokens: matches nothing, same as the empty junction.
    Box::new(BooleanQuery::new(terms))
}

fn created_at_term(index: &PostIndex, day: NaiveDate) -> Term {
    let midnight = day.and_time(NaiveTime::MIN).and_utc().timestamp();
    Term::from_field_i64(index.fields().created_at, midnight)
}
