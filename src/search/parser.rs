//! Hand-rolled parser for the free-text query language.
//!
//! Supported grammar, a subset of the classic Lucene syntax:
//!
//! - bare terms (analyzed against the content fields, the default field)
//! - quoted phrases: `"exact phrase"`
//! - field terms: `source:web`, `replied_to:michael`, `year:2016`,
//!   `country_code:de`, `content:word`, including `field:"a phrase"`
//! - boolean operators `AND`, `OR`, `NOT` and the `+`/`-` prefixes
//! - parenthesized groups
//! - trailing wildcards: `tweet*`
//!
//! Leading wildcards are rejected with a parse error; they would force a full
//! dictionary scan. Term values for content are analyzed with the same
//! pipelines used at index time; wildcard terms are only lowercased, never
//! stemmed. Adjacent clauses without an operator are OR-ed, matching the
//! classic default operator.

use tantivy::Term;
use tantivy::query::{BooleanQuery, Occur, PhraseQuery, Query, RegexQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};

use crate::error::{ArchiveError, Result};
use crate::index::{PostIndex, analyze};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Term {
        field: Option<String>,
        text: String,
        /// Trailing `*` present (already stripped from `text`).
        wildcard: bool,
    },
    Phrase {
        field: Option<String>,
        text: String,
    },
    And,
    Or,
    Not,
    Plus,
    Minus,
    LParen,
    RParen,
}

/// Parses a query-language expression into a tantivy query.
///
/// Fails with [`ArchiveError::QueryParse`] on malformed input; callers decide
/// whether to surface or swallow that (the archive facade logs and returns an
/// empty result set).
pub fn parse_expression(index: &PostIndex, expression: &str) -> Result<Box<dyn Query>> {
    if expression.trim().is_empty() {
        return Err(ArchiveError::invalid_query(
            "query expression must not be blank",
        ));
    }
    let tokens = lex(expression)?;
    let mut parser = Parser {
        index,
        tokens,
        position: 0,
    };
    let query = parser.parse_group(0)?;
    if parser.position < parser.tokens.len() {
        return Err(ArchiveError::query_parse("unbalanced closing parenthesis"));
    }
    Ok(query)
}

// --- lexing ---------------------------------------------------------------

fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '"' => {
                chars.next();
                let text = read_phrase(&mut chars)?;
                tokens.push(Token::Phrase { field: None, text });
            }
            _ => tokens.push(lex_word(&mut chars)?),
        }
    }
    if tokens.is_empty() {
        return Err(ArchiveError::query_parse("expression holds no terms"));
    }
    Ok(tokens)
}

/// Collects characters up to the closing quote.
fn read_phrase(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String> {
    let mut text = String::new();
    for c in chars.by_ref() {
        if c == '"' {
            if text.trim().is_empty() {
                return Err(ArchiveError::query_parse("empty phrase"));
            }
            return Ok(text);
        }
        text.push(c);
    }
    Err(ArchiveError::query_parse("unterminated phrase"))
}

/// Reads one word unit: an operator keyword, a bare term, or a
/// `field:value` pair (value may itself be a phrase).
fn lex_word(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Token> {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
            break;
        }
        if c == ':' {
            chars.next();
            if word.is_empty() {
                return Err(ArchiveError::query_parse("missing field name before ':'"));
            }
            return lex_field_value(word, chars);
        }
        word.push(c);
        chars.next();
    }
    match word.as_str() {
        "AND" => Ok(Token::And),
        "OR" => Ok(Token::Or),
        "NOT" => Ok(Token::Not),
        _ => term_token(None, word),
    }
}

/// Reads the value part after `field:`.
fn lex_field_value(
    field: String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Token> {
    if chars.peek() == Some(&'"') {
        chars.next();
        let text = read_phrase(chars)?;
        return Ok(Token::Phrase {
            field: Some(field),
            text,
        });
    }
    let mut value = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
            break;
        }
        value.push(c);
        chars.next();
    }
    if value.is_empty() {
        return Err(ArchiveError::query_parse(format!(
            "field '{field}' has no value"
        )));
    }
    term_token(Some(field), value)
}

/// Applies the wildcard rules to a raw term.
fn term_token(field: Option<String>, text: String) -> Result<Token> {
    if text.starts_with('*') || text.starts_with('?') {
        return Err(ArchiveError::query_parse(
            "leading wildcards are not allowed",
        ));
    }
    if let Some(prefix) = text.strip_suffix('*') {
        if prefix.is_empty() {
            return Err(ArchiveError::query_parse(
                "wildcard must follow at least one character",
            ));
        }
        if prefix.contains('*') || prefix.contains('?') {
            return Err(ArchiveError::query_parse(
                "only a single trailing wildcard is supported",
            ));
        }
        return Ok(Token::Term {
            field,
            text: prefix.to_string(),
            wildcard: true,
        });
    }
    if text.contains('*') || text.contains('?') {
        return Err(ArchiveError::query_parse(
            "only a single trailing wildcard is supported",
        ));
    }
    Ok(Token::Term {
        field,
        text,
        wildcard: false,
    })
}

// --- parsing --------------------------------------------------------------

struct Parser<'a> {
    index: &'a PostIndex,
    tokens: Vec<Token>,
    position: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Parses clauses until the end of input or the group's closing paren.
    ///
    /// Occur assignment follows the classic parser: bare adjacency and `OR`
    /// yield `Should`, `AND` upgrades both operands to `Must`, `+` forces
    /// `Must`, `-`/`NOT` force `MustNot`.
    fn parse_group(&mut self, depth: usize) -> Result<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        let mut upgrade_next = false;
        let mut expect_operand = false;
        loop {
            match self.peek() {
                None => break,
                Some(Token::RParen) => {
                    if depth == 0 {
                        return Err(ArchiveError::query_parse(
                            "unbalanced closing parenthesis",
                        ));
                    }
                    break;
                }
                Some(Token::And) => {
                    self.advance();
                    if clauses.is_empty() {
                        return Err(ArchiveError::query_parse("'AND' needs a left operand"));
                    }
                    if let Some(last) = clauses.last_mut() {
                        if last.0 == Occur::Should {
                            last.0 = Occur::Must;
                        }
                    }
                    upgrade_next = true;
                    expect_operand = true;
                }
                Some(Token::Or) => {
                    self.advance();
                    if clauses.is_empty() {
                        return Err(ArchiveError::query_parse("'OR' needs a left operand"));
                    }
                    upgrade_next = false;
                    expect_operand = true;
                }
                Some(Token::Plus) => {
                    self.advance();
                    if let Some(query) = self.parse_primary(depth)? {
                        clauses.push((Occur::Must, query));
                    }
                    upgrade_next = false;
                    expect_operand = false;
                }
                Some(Token::Minus | Token::Not) => {
                    self.advance();
                    if let Some(query) = self.parse_primary(depth)? {
                        clauses.push((Occur::MustNot, query));
                    }
                    upgrade_next = false;
                    expect_operand = false;
                }
                Some(_) => {
                    let occur = if upgrade_next { Occur::Must } else { Occur::Should };
                    if let Some(query) = self.parse_primary(depth)? {
                        clauses.push((occur, query));
                    }
                    upgrade_next = false;
                    expect_operand = false;
                }
            }
        }
        if expect_operand {
            return Err(ArchiveError::query_parse("operator is missing its operand"));
        }
        if clauses.is_empty() {
            return Err(ArchiveError::query_parse("expression holds no terms"));
        }
        if clauses.len() == 1 && clauses[0].0 != Occur::MustNot {
            let (_, only) = clauses.remove(0);
            return Ok(only);
        }
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// A parenthesized group, a term, or a phrase. `None` when an analyzed
    /// term dissolves into no tokens (dropped, like the classic parser).
    fn parse_primary(&mut self, depth: usize) -> Result<Option<Box<dyn Query>>> {
        match self.advance() {
            Some(Token::LParen) => {
                let group = self.parse_group(depth + 1)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(Some(group)),
                    _ => Err(ArchiveError::query_parse("missing closing parenthesis")),
                }
            }
            Some(Token::Term {
                field,
                text,
                wildcard,
            }) => match field.as_deref() {
                None | Some("content") => {
                    if wildcard {
                        self.content_wildcard(&text).map(Some)
                    } else {
                        Ok(self.content_term(&text))
                    }
                }
                Some(name) => self.exact_field_query(name, &text, wildcard).map(Some),
            },
            Some(Token::Phrase { field, text }) => match field.as_deref() {
                None | Some("content") => Ok(self.content_phrase(&text)),
                Some(name) => self.exact_field_query(name, &text, false).map(Some),
            },
            _ => Err(ArchiveError::query_parse(
                "operator is missing its operand",
            )),
        }
    }

    /// An analyzed term over all content fields, should-composed.
    fn content_term(&self, text: &str) -> Option<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (language, field) in self.index.fields().content_fields() {
            let mut analyzer = self.index.analyzer_for(language);
            let tokens = analyze(&mut analyzer, text);
            if let Some(query) = Self::tokens_to_query(field, &tokens) {
                clauses.push((Occur::Should, query));
            }
        }
        if clauses.is_empty() {
            return None;
        }
        Some(Box::new(BooleanQuery::new(clauses)))
    }

    /// An analyzed phrase over all content fields.
    fn content_phrase(&self, text: &str) -> Option<Box<dyn Query>> {
        // Same path as a term: multi-token analysis becomes a phrase query.
        self.content_term(text)
    }

    /// A trailing-wildcard term over all content fields. Wildcards bypass
    /// stemming; the prefix is only lowercased to match indexed terms.
    fn content_wildcard(&self, prefix: &str) -> Result<Box<dyn Query>> {
        let pattern = format!("{}.*", regex::escape(&prefix.to_lowercase()));
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (_, field) in self.index.fields().content_fields() {
            let query = RegexQuery::from_pattern(&pattern, field)
                .map_err(|e| ArchiveError::query_parse(e.to_string()))?;
            clauses.push((Occur::Should, Box::new(query)));
        }
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// A query against one of the exact-match (non-analyzed) fields.
    fn exact_field_query(
        &self,
        name: &str,
        value: &str,
        wildcard: bool,
    ) -> Result<Box<dyn Query>> {
        let fields = self.index.fields();
        let field = match name {
            "source" => fields.source,
            "country_code" => fields.country_code,
            "replied_to" => fields.replied_to,
            "year" => {
                if wildcard {
                    return Err(ArchiveError::query_parse(
                        "wildcards are not supported on 'year'",
                    ));
                }
                let year: u64 = value.parse().map_err(|_| {
                    ArchiveError::query_parse(format!("'{value}' is not a valid year"))
                })?;
                return Ok(Box::new(TermQuery::new(
                    Term::from_field_u64(fields.year, year),
                    IndexRecordOption::Basic,
                )));
            }
            other => {
                return Err(ArchiveError::query_parse(format!(
                    "unknown field '{other}'"
                )));
            }
        };
        if wildcard {
            let pattern = format!("{}.*", regex::escape(value));
            let query = RegexQuery::from_pattern(&pattern, field)
                .map_err(|e| ArchiveError::query_parse(e.to_string()))?;
            return Ok(Box::new(query));
        }
        Ok(Box::new(TermQuery::new(
            Term::from_field_text(field, value),
            IndexRecordOption::Basic,
        )))
    }

    /// One analyzed token becomes a term query, several become a phrase.
    fn tokens_to_query(field: Field, tokens: &[String]) -> Option<Box<dyn Query>> {
        match tokens {
            [] => None,
            [only] => Some(Box::new(TermQuery::new(
                Term::from_field_text(field, only),
                IndexRecordOption::WithFreqs,
            ))),
            many => {
                let terms: Vec<Term> = many
                    .iter()
                    .map(|t| Term::from_field_text(field, t))
                    .collect();
                Some(Box::new(PhraseQuery::new(terms)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> PostIndex {
        PostIndex::in_ram().unwrap()
    }

    fn parse_err(expression: &str) -> ArchiveError {
        parse_expression(&index(), expression).unwrap_err()
    }

    #[test]
    fn bare_term_parses() {
        assert!(parse_expression(&index(), "archive").is_ok());
    }

    #[test]
    fn multiple_terms_parse() {
        assert!(parse_expression(&index(), "archive tweets search").is_ok());
    }

    #[test]
    fn phrase_parses() {
        assert!(parse_expression(&index(), "\"tweet archive\"").is_ok());
    }

    #[test]
    fn boolean_operators_parse() {
        let idx = index();
        assert!(parse_expression(&idx, "archive AND tweets").is_ok());
        assert!(parse_expression(&idx, "archive OR tweets").is_ok());
        assert!(parse_expression(&idx, "archive NOT tweets").is_ok());
        assert!(parse_expression(&idx, "+archive -tweets").is_ok());
    }

    #[test]
    fn groups_parse() {
        assert!(parse_expression(&index(), "(archive OR tweets) AND search").is_ok());
    }

    #[test]
    fn field_terms_parse() {
        let idx = index();
        assert!(parse_expression(&idx, "source:web").is_ok());
        assert!(parse_expression(&idx, "source:\"Twitter for Mac\"").is_ok());
        assert!(parse_expression(&idx, "replied_to:michael").is_ok());
        assert!(parse_expression(&idx, "country_code:de").is_ok());
        assert!(parse_expression(&idx, "year:2016").is_ok());
        assert!(parse_expression(&idx, "content:archive").is_ok());
    }

    #[test]
    fn trailing_wildcard_parses() {
        let idx = index();
        assert!(parse_expression(&idx, "tweet*").is_ok());
        assert!(parse_expression(&idx, "source:Twitter*").is_ok());
    }

    #[test]
    fn leading_wildcard_is_a_parse_error() {
        assert!(matches!(
            parse_err("*foo"),
            ArchiveError::QueryParse { .. }
        ));
        assert!(matches!(
            parse_err("?foo"),
            ArchiveError::QueryParse { .. }
        ));
        assert!(matches!(
            parse_err("archive OR *foo"),
            ArchiveError::QueryParse { .. }
        ));
    }

    #[test]
    fn inner_wildcards_are_rejected() {
        assert!(matches!(
            parse_err("fo*o"),
            ArchiveError::QueryParse { .. }
        ));
        assert!(matches!(parse_err("f?o"), ArchiveError::QueryParse { .. }));
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        assert!(matches!(
            parse_err("bogus:value"),
            ArchiveError::QueryParse { .. }
        ));
    }

    #[test]
    fn invalid_year_is_a_parse_error() {
        assert!(matches!(
            parse_err("year:abc"),
            ArchiveError::QueryParse { .. }
        ));
    }

    #[test]
    fn dangling_operator_is_a_parse_error() {
        let idx = index();
        assert!(parse_expression(&idx, "archive AND").is_err());
        assert!(parse_expression(&idx, "OR archive").is_err());
        assert!(parse_expression(&idx, "+").is_err());
    }

    #[test]
    fn unbalanced_parens_are_a_parse_error() {
        let idx = index();
        assert!(parse_expression(&idx, "(archive").is_err());
        assert!(parse_expression(&idx, "archive)").is_err());
    }

    #[test]
    fn unterminated_phrase_is_a_parse_error() {
        assert!(matches!(
            parse_err("\"tweet archive"),
            ArchiveError::QueryParse { .. }
        ));
    }

    #[test]
    fn blank_expression_is_invalid() {
        assert!(matches!(
            parse_err("   "),
            ArchiveError::InvalidQuery { .. }
        ));
    }
}
