//! Query normalization.
//!
//! Reduces raw user text to a [`SearchTerm`]. When a [`KeywordExtractor`] is
//! configured, only nouns, proper nouns and adjectives survive, joined by
//! single spaces in their original order. Without an extractor, or when it
//! fails or keeps nothing, the trimmed input is used as-is.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::SearchTerm;

/// Coarse part-of-speech tag (Universal Dependencies names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartOfSpeech {
    Noun,
    ProperNoun,
    Adjective,
    Verb,
    Other,
}

impl PartOfSpeech {
    /// Parse a UD tag such as `NOUN`, `PROPN` or `ADJ`. Unknown tags map to
    /// [`PartOfSpeech::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "NOUN" => Self::Noun,
            "PROPN" => Self::ProperNoun,
            "ADJ" => Self::Adjective,
            "VERB" | "AUX" => Self::Verb,
            _ => Self::Other,
        }
    }

    /// Whether tokens with this tag are kept as search keywords.
    pub fn is_keyword(self) -> bool {
        matches!(self, Self::Noun | Self::ProperNoun | Self::Adjective)
    }
}

/// A token with its part-of-speech tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub text: String,
    pub pos: PartOfSpeech,
}

impl TaggedToken {
    pub fn new(text: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self {
            text: text.into(),
            pos,
        }
    }
}

/// Optional tokenizer/tagger capability.
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    /// Short name for logs (e.g. `"lexicon"`).
    fn name(&self) -> &str;

    /// Tokenize and tag `text`, preserving token order.
    async fn extract(&self, text: &str) -> Result<Vec<TaggedToken>>;
}

/// Turns raw input into a search term.
pub struct QueryNormalizer {
    extractor: Option<Box<dyn KeywordExtractor>>,
}

impl QueryNormalizer {
    pub fn new(extractor: Option<Box<dyn KeywordExtractor>>) -> Self {
        Self { extractor }
    }

    /// A normalizer that only trims.
    pub fn plain() -> Self {
        Self { extractor: None }
    }

    /// Never fails; the result may be empty.
    pub async fn normalize(&self, raw: &str) -> SearchTerm {
        let cleaned = raw.trim();
        let Some(extractor) = &self.extractor else {
            return SearchTerm::new(cleaned);
        };

        match extractor.extract(cleaned).await {
            Ok(tokens) => {
                let keywords: Vec<&str> = tokens
                    .iter()
                    .filter(|t| t.pos.is_keyword())
                    .map(|t| t.text.as_str())
                    .filter(|t| !t.is_empty())
                    .collect();
                if keywords.is_empty() {
                    debug!(extractor = extractor.name(), "no keywords kept, using raw input");
                    SearchTerm::new(cleaned)
                } else {
                    SearchTerm::new(keywords.join(" "))
                }
            }
            Err(e) => {
                warn!(extractor = extractor.name(), error = %e, "keyword extraction failed");
                SearchTerm::new(cleaned)
            }
        }
    }
}
