//! Keyword extractor implementations.
//!
//! - **`lexicon`** — tags tokens from a TOML word list; no network.
//! - **`http`** — posts the text to a tagging service (e.g. a spaCy server).
//!
//! Use [`create_extractor`] to build the configured one; `disabled` yields
//! `None` and the normalizer falls back to the trimmed query.
//!
//! # Lexicon format
//!
//! ```toml
//! [tags]
//! "تجديد" = "NOUN"
//! "رخصة" = "NOUN"
//! "القيادة" = "NOUN"
//! "كيف" = "ADV"
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use arshidni_core::error::{PipelineError, Result as PipelineResult};
use arshidni_core::normalize::{KeywordExtractor, PartOfSpeech, TaggedToken};

use crate::config::KeywordsConfig;

/// Build the extractor named by `config.provider`.
pub fn create_extractor(config: &KeywordsConfig) -> Result<Option<Box<dyn KeywordExtractor>>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "lexicon" => {
            let path = config
                .lexicon_path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("keywords.lexicon_path required"))?;
            Ok(Some(Box::new(LexiconExtractor::load(path)?)))
        }
        "http" => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("keywords.url required"))?;
            Ok(Some(Box::new(HttpExtractor::new(url))))
        }
        other => anyhow::bail!("Unknown keywords provider: {}", other),
    }
}

/// Split on whitespace and strip surrounding punctuation (`؟`, `،`, `.`).
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect()
}

// ============ Lexicon ============

#[derive(Debug, Deserialize)]
struct LexiconFile {
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Dictionary tagger. Unknown tokens are tagged [`PartOfSpeech::Other`].
pub struct LexiconExtractor {
    tags: HashMap<String, PartOfSpeech>,
}

impl LexiconExtractor {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse lexicon: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: LexiconFile = toml::from_str(content)?;
        Ok(Self::from_tags(
            file.tags
                .into_iter()
                .map(|(word, tag)| (word, PartOfSpeech::from_tag(&tag))),
        ))
    }

    pub fn from_tags(tags: impl IntoIterator<Item = (String, PartOfSpeech)>) -> Self {
        Self {
            tags: tags
                .into_iter()
                .map(|(word, pos)| (word.to_lowercase(), pos))
                .collect(),
        }
    }

    fn tag(&self, token: &str) -> PartOfSpeech {
        self.tags
            .get(&token.to_lowercase())
            .copied()
            .unwrap_or(PartOfSpeech::Other)
    }
}

#[async_trait]
impl KeywordExtractor for LexiconExtractor {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn extract(&self, text: &str) -> PipelineResult<Vec<TaggedToken>> {
        Ok(tokenize(text)
            .into_iter()
            .map(|t| TaggedToken::new(t, self.tag(t)))
            .collect())
    }
}

// ============ HTTP ============

/// Token shape returned by the tagging service.
#[derive(Debug, Deserialize)]
struct WireToken {
    text: String,
    pos: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Wrapped { tokens: Vec<WireToken> },
    Bare(Vec<WireToken>),
}

/// Remote tagger: `POST {url}` with `{"text": ...}`.
pub struct HttpExtractor {
    url: String,
    client: reqwest::Client,
}

impl HttpExtractor {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

fn parse_wire_response(json: serde_json::Value) -> PipelineResult<Vec<TaggedToken>> {
    let response: WireResponse =
        serde_json::from_value(json).map_err(PipelineError::extraction)?;
    let tokens = match response {
        WireResponse::Wrapped { tokens } => tokens,
        WireResponse::Bare(tokens) => tokens,
    };
    Ok(tokens
        .into_iter()
        .map(|t| TaggedToken::new(t.text, PartOfSpeech::from_tag(&t.pos)))
        .collect())
}

#[async_trait]
impl KeywordExtractor for HttpExtractor {
    fn name(&self) -> &str {
        "http"
    }

    async fn extract(&self, text: &str) -> PipelineResult<Vec<TaggedToken>> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(PipelineError::extraction)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::extraction(format!(
                "tagger returned {}",
                status
            )));
        }

        let json: serde_json::Value = response.json().await.map_err(PipelineError::extraction)?;
        parse_wire_response(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arshidni_core::normalize::QueryNormalizer;

    #[test]
    fn tokenize_strips_arabic_punctuation() {
        assert_eq!(
            tokenize("كيف أجدد رخصة القيادة؟"),
            vec!["كيف", "أجدد", "رخصة", "القيادة"]
        );
        assert_eq!(tokenize("  ،  "), Vec::<&str>::new());
    }

    #[tokio::test]
    async fn lexicon_keeps_known_nouns() {
        let lexicon = LexiconExtractor::parse(
            r#"
            [tags]
            "تجديد" = "NOUN"
            "رخصة" = "NOUN"
            "أريد" = "VERB"
            "Absher" = "PROPN"
            "#,
        )
        .unwrap();

        let normalizer = QueryNormalizer::new(Some(Box::new(lexicon)));
        let term = normalizer.normalize("أريد تجديد رخصة من absher!").await;
        assert_eq!(term.as_str(), "تجديد رخصة absher");
    }

    #[test]
    fn wire_response_accepts_both_shapes() {
        let bare = serde_json::json!([{"text": "رخصة", "pos": "NOUN"}]);
        let wrapped = serde_json::json!({"tokens": [{"text": "جديد", "pos": "ADJ"}]});

        let tokens = parse_wire_response(bare).unwrap();
        assert_eq!(tokens[0].pos, PartOfSpeech::Noun);
        let tokens = parse_wire_response(wrapped).unwrap();
        assert_eq!(tokens[0].pos, PartOfSpeech::Adjective);

        assert!(parse_wire_response(serde_json::json!({"oops": 1})).is_err());
    }

    #[test]
    fn disabled_provider_builds_nothing() {
        let cfg = KeywordsConfig::default();
        assert!(create_extractor(&cfg).unwrap().is_none());
    }

    #[test]
    fn http_provider_builds_without_contacting_the_tagger() {
        let cfg = KeywordsConfig {
            provider: "http".to_string(),
            lexicon_path: None,
            url: Some("http://127.0.0.1:9/tag".to_string()),
        };
        let extractor = create_extractor(&cfg).unwrap().unwrap();
        assert_eq!(extractor.name(), "http");
    }
}
