//! TOML configuration parsing.
//!
//! ```toml
//! [db]
//! path = "./data/arshidni.sqlite"
//!
//! [keywords]
//! provider = "lexicon"          # disabled | lexicon | http
//! lexicon_path = "./config/lexicon.toml"
//!
//! [generation]
//! provider = "gemini"           # gemini | openai | ollama | disabled
//! model = "gemini-2.5-flash"
//! max_context_chars = 12000
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```
//!
//! API keys are read from `GEMINI_API_KEY` / `OPENAI_API_KEY`, never from
//! the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use arshidni_core::router::DEFAULT_MAX_CONTEXT_CHARS;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub keywords: KeywordsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeywordsConfig {
    #[serde(default = "default_keywords_provider")]
    pub provider: String,
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            provider: default_keywords_provider(),
            lexicon_path: None,
            url: None,
        }
    }
}

fn default_keywords_provider() -> String {
    "disabled".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL override (Ollama host, OpenAI-compatible gateway, ...).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    /// No timeout unless set.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_model(),
            url: None,
            max_context_chars: default_max_context_chars(),
            timeout_secs: None,
        }
    }
}

fn default_generation_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_max_context_chars() -> usize {
    DEFAULT_MAX_CONTEXT_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.generation.max_context_chars == 0 {
        anyhow::bail!("generation.max_context_chars must be > 0");
    }
    if config.generation.model.trim().is_empty() {
        anyhow::bail!("generation.model must not be empty");
    }

    match config.generation.provider.as_str() {
        "gemini" | "openai" | "ollama" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be gemini, openai, ollama, or disabled.",
            other
        ),
    }

    match config.keywords.provider.as_str() {
        "disabled" => {}
        "lexicon" => {
            if config.keywords.lexicon_path.is_none() {
                anyhow::bail!("keywords.lexicon_path must be set when provider is 'lexicon'");
            }
        }
        "http" => {
            if config.keywords.url.is_none() {
                anyhow::bail!("keywords.url must be set when provider is 'http'");
            }
        }
        other => anyhow::bail!(
            "Unknown keywords provider: '{}'. Must be disabled, lexicon, or http.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config("[db]\npath = \"./data/a.sqlite\"\n").unwrap();
        assert_eq!(cfg.generation.provider, "gemini");
        assert_eq!(cfg.generation.model, "gemini-2.5-flash");
        assert_eq!(cfg.generation.max_context_chars, DEFAULT_MAX_CONTEXT_CHARS);
        assert_eq!(cfg.generation.timeout_secs, None);
        assert_eq!(cfg.keywords.provider, "disabled");
        assert_eq!(cfg.server.bind, "127.0.0.1:7341");
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = parse_config("[db]\npath = \"a\"\n[generation]\nprovider = \"bard\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("Unknown generation provider"));
    }

    #[test]
    fn lexicon_requires_path() {
        let err = parse_config("[db]\npath = \"a\"\n[keywords]\nprovider = \"lexicon\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("lexicon_path"));
    }

    #[test]
    fn zero_context_is_rejected() {
        let err = parse_config("[db]\npath = \"a\"\n[generation]\nmax_context_chars = 0\n")
            .unwrap_err();
        assert!(err.to_string().contains("max_context_chars"));
    }
}
