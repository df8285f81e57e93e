//! Tantivy schema for the post index.
//!
//! The store is the source of truth; the index keeps only what search needs.
//! `content` is the sole analyzed field and exists three times, once per
//! analyzer, because tantivy binds a tokenizer to a field rather than to a
//! document. Each post populates exactly the content field matching its
//! language tag. All other fields are exact-match terms, never tokenized.

use tantivy::schema::{
    FAST, Field, INDEXED, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing,
    TextOptions,
};

use super::analyzer::ContentLanguage;

/// Field handles for the post index, resolved once at schema build time.
#[derive(Debug, Clone)]
pub struct PostFields {
    /// Post id. Indexed so postings can be deleted by term.
    pub id: Field,
    /// Creation time as utc unix seconds. Range-queryable.
    pub created_at: Field,
    /// Analyzed content, English pipeline.
    pub content_en: Field,
    /// Analyzed content, German pipeline.
    pub content_de: Field,
    /// Analyzed content, undetermined pipeline (lowercase only).
    pub content_und: Field,
    /// Client label, exact match.
    pub source: Field,
    /// Country code, exact match.
    pub country_code: Field,
    /// Screen name of the replied-to author, exact match.
    pub replied_to: Field,
    /// Derived calendar-year facet. Indexed, not stored.
    pub year: Field,
}

impl PostFields {
    /// The content field a post of the given language is indexed under.
    #[must_use]
    pub fn content_for(&self, language: ContentLanguage) -> Field {
        match language {
            ContentLanguage::English => self.content_en,
            ContentLanguage::German => self.content_de,
            ContentLanguage::Undetermined => self.content_und,
        }
    }

    /// All content fields, in schema order. Queries fan out over these.
    #[must_use]
    pub fn content_fields(&self) -> [(ContentLanguage, Field); 3] {
        [
            (ContentLanguage::English, self.content_en),
            (ContentLanguage::German, self.content_de),
            (ContentLanguage::Undetermined, self.content_und),
        ]
    }
}

/// Builds the index schema and its field handles.
#[must_use]
pub fn build_schema() -> (Schema, PostFields) {
    let mut builder = Schema::builder();

    let id = builder.add_u64_field("id", INDEXED | STORED | FAST);
    let created_at = builder.add_i64_field("created_at", INDEXED | STORED | FAST);

    let content_field = |language: ContentLanguage| {
        TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(language.tokenizer_name())
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
    };
    let content_en =
        builder.add_text_field("content_en", content_field(ContentLanguage::English));
    let content_de = builder.add_text_field("content_de", content_field(ContentLanguage::German));
    let content_und = builder.add_text_field(
        "content_und",
        content_field(ContentLanguage::Undetermined),
    );

    let source = builder.add_text_field("source", STRING | STORED);
    let country_code = builder.add_text_field("country_code", STRING);
    let replied_to = builder.add_text_field("replied_to", STRING | STORED);
    let year = builder.add_u64_field("year", INDEXED);

    let schema = builder.build();
    let fields = PostFields {
        id,
        created_at,
        content_en,
        content_de,
        content_und,
        source,
        country_code,
        replied_to,
        year,
    };
    (schema, fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_field_follows_language() {
        let (_, fields) = build_schema();
        assert_eq!(fields.content_for(ContentLanguage::English), fields.content_en);
        assert_eq!(fields.content_for(ContentLanguage::German), fields.content_de);
        assert_eq!(
            fields.content_for(ContentLanguage::Undetermined),
            fields.content_und
        );
    }

    #[test]
    fn schema_resolves_all_fields_by_name() {
        let (schema, fields) = build_schema();
        assert_eq!(schema.get_field("id").unwrap(), fields.id);
        assert_eq!(schema.get_field("created_at").unwrap(), fields.created_at);
        assert_eq!(schema.get_field("year").unwrap(), fields.year);
        assert_eq!(schema.get_field("replied_to").unwrap(), fields.replied_to);
    }
}
