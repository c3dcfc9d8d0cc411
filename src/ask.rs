//! Query commands: `ask`, `context`, `chat` and `classify`.
//!
//! All of them share one [`Pipeline`] built from the configuration by
//! [`build_pipeline`]. Answers go to stdout; logs go to stderr.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use arshidni_core::intent::classify_intent;
use arshidni_core::normalize::QueryNormalizer;
use arshidni_core::pipeline::Pipeline;
use arshidni_core::router::ResponseRouter;

use crate::config::Config;
use crate::db;
use crate::generation::create_generator;
use crate::keywords::create_extractor;
use crate::sqlite_store::SqliteCatalog;

/// Words that end the console session.
const EXIT_WORDS: &[&str] = &["خروج", "إنهاء", "exit"];

const BANNER: &str = "🤖 أرشدني - دليل الخدمات الحكومية التفاعلي";
const FAREWELL: &str = "شكراً لاستخدامك النظام. مع السلامة.";

/// Wire the pipeline: keyword extractor, SQLite catalog, generator, router.
pub fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let normalizer = QueryNormalizer::new(create_extractor(&config.keywords)?);
    let store = Arc::new(SqliteCatalog::new(db::connect_lazy(config)?));
    let generator = create_generator(&config.generation)?;
    let router = ResponseRouter::new(
        config.generation.model.clone(),
        config.generation.max_context_chars,
    );
    Ok(Pipeline::new(normalizer, store, generator, router))
}

/// `arshidni ask "<query>"`
pub async fn run_ask(config: &Config, query: &str) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    println!("{}", pipeline.reply(query).await);
    Ok(())
}

/// `arshidni context "<query>"` — everything up to, but excluding, generation.
pub async fn run_context(config: &Config, query: &str, json: bool) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let retrieval = pipeline.retrieve(query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&retrieval)?);
        return Ok(());
    }

    println!("term:   {}", retrieval.term);
    match retrieval.target {
        Some(target) => println!("target: {} {}", target.kind, target.id),
        None => println!("target: (none)"),
    }
    println!("mode:   {}", retrieval.mode);
    println!();
    println!("--- Context ---");
    println!("{}", retrieval.context);
    Ok(())
}

/// `arshidni classify "<query>"`
pub async fn run_classify(config: &Config, query: &str) -> Result<()> {
    let generator = create_generator(&config.generation)?;
    let intent = classify_intent(generator.as_ref(), &config.generation.model, query).await;
    println!("{}", intent);
    Ok(())
}

pub fn is_exit_word(line: &str) -> bool {
    let line = line.trim().to_lowercase();
    EXIT_WORDS.iter().any(|w| *w == line)
}

/// `arshidni chat` — one line in, one answer out, until an exit word or EOF.
pub async fn run_chat(config: &Config) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let interactive = atty::is(atty::Stream::Stdin);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if interactive {
        stdout.write_all(format!("{}\n", BANNER).as_bytes()).await?;
    }

    loop {
        if interactive {
            stdout.write_all("\n👤 أنت: ".as_bytes()).await?;
            stdout.flush().await?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        if is_exit_word(&line) {
            break;
        }

        let answer = pipeline.reply(&line).await;
        if interactive {
            stdout
                .write_all(format!("\n🤖 أرشدني:\n{}\n", answer).as_bytes())
                .await?;
        } else {
            stdout.write_all(format!("{}\n", answer).as_bytes()).await?;
        }
        stdout.flush().await?;
    }

    stdout.write_all(format!("{}\n", FAREWELL).as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_are_case_insensitive() {
        assert!(is_exit_word("EXIT"));
        assert!(is_exit_word("  خروج "));
        assert!(is_exit_word("إنهاء"));
        assert!(!is_exit_word("تجديد رخصة"));
    }
}
