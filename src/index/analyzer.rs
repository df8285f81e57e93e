//! Text analysis pipeline with per-language analyzer selection.
//!
//! Pipeline: `SimpleTokenizer` → `LowerCaser` → `RemoveLongFilter` →
//! optional language stemmer. Which stemmer runs is decided per post from its
//! machine-detected language tag; everything outside the supported set falls
//! back to the undetermined pipeline (lowercase only). The discriminator is a
//! pure function over a closed enum and never errors.

use tantivy::Index;
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer, TokenStream,
};

use crate::constants::MAX_TOKEN_LENGTH;

/// Language routing for a post's content field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentLanguage {
    English,
    German,
    /// No language detected, or one without a registered pipeline.
    Undetermined,
}

impl ContentLanguage {
    /// All variants, in schema order.
    pub const ALL: [ContentLanguage; 3] = [
        ContentLanguage::English,
        ContentLanguage::German,
        ContentLanguage::Undetermined,
    ];

    /// Resolves a raw language tag to a pipeline. Case-insensitive and
    /// fail-closed: unknown or absent tags land on `Undetermined`.
    #[must_use]
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::to_ascii_lowercase).as_deref() {
            Some("en") => ContentLanguage::English,
            Some("de") => ContentLanguage::German,
            _ => ContentLanguage::Undetermined,
        }
    }

    /// Name the analyzer is registered under, also the content field suffix.
    #[must_use]
    pub fn tokenizer_name(self) -> &'static str {
        match self {
            ContentLanguage::English => "archive_en",
            ContentLanguage::German => "archive_de",
            ContentLanguage::Undetermined => "archive_und",
        }
    }

    /// Builds the analyzer chain for this language.
    #[must_use]
    pub fn build_analyzer(self) -> TextAnalyzer {
        let base = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH));
        match self {
            ContentLanguage::English => base.filter(Stemmer::new(Language::English)).build(),
            ContentLanguage::German => base.filter(Stemmer::new(Language::German)).build(),
            ContentLanguage::Undetermined => base.build(),
        }
    }
}

/// Registers all content analyzers with an index. Must run before the first
/// writer or query touches a content field.
pub fn register_analyzers(index: &Index) {
    for language in ContentLanguage::ALL {
        index
            .tokenizers()
            .register(language.tokenizer_name(), language.build_analyzer());
    }
}

/// Runs `text` through `analyzer` and collects the emitted token texts.
pub(crate) fn analyze(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while let Some(token) = stream.next() {
        tokens.push(token.text.clone());
    }
    tokens
}
