//! # Arshidni Core
//!
//! Storage-agnostic core of the Arshidni government-services assistant:
//! turns a free-text question into a retrieval-grounded context and picks
//! how the answer should be generated.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`normalize`] | Query normalization and the keyword-extractor trait |
//! | [`resolve`] | Journey-then-service entity resolution |
//! | [`fetch`] | Joined-row retrieval for a resolved target |
//! | [`assemble`] | Folding joined rows into a context document |
//! | [`router`] | RAG/GENERAL selection and prompt templates |
//! | [`pipeline`] | The composed per-query flow |
//! | [`store`] | Catalog store traits and the in-memory store |
//! | [`generation`] | Text-generation trait |
//! | [`intent`] | Optional intent classifier |
//! | [`catalog`] | Importable catalog records |
//! | [`models`] | Data types shared by all stages |
//! | [`error`] | Error taxonomy |

pub mod assemble;
pub mod catalog;
pub mod error;
pub mod fetch;
pub mod generation;
pub mod intent;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod resolve;
pub mod router;
pub mod store;
