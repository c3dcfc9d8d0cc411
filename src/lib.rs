//! # Arshidni
//!
//! A retrieval-grounded assistant for Saudi government services.
//!
//! A free-text question is reduced to a search term, resolved to one
//! journey (a bundle of services) or one service, expanded through the
//! catalog's relational graph into a structured context, and handed to a
//! text-generation model with a mode-specific prompt.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────┐   ┌──────────┐
//! │  Query   │──▶│ Normalize  │──▶│ Resolve +    │──▶│  Route   │──▶ LLM
//! │ CLI/HTTP │   │ (keywords) │   │ Fetch (SQL)  │   │ RAG/GEN  │
//! └──────────┘   └────────────┘   └──────────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! arshidni init                         # create database
//! arshidni import demos/catalog.toml    # load the service catalog
//! arshidni context "تجديد رخصة"         # inspect retrieval
//! arshidni ask "تجديد رخصة"             # full answer
//! arshidni chat                         # console session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`import`] | Catalog import |
//! | [`sqlite_store`] | SQLite catalog store |
//! | [`keywords`] | Keyword extractors |
//! | [`generation`] | Text-generation backends |
//! | [`ask`] | Query commands and console loop |
//! | [`server`] | HTTP server |

pub mod ask;
pub mod config;
pub mod db;
pub mod generation;
pub mod import;
pub mod keywords;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
