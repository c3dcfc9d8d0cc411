//! Core data models that flow through the per-query pipeline.
//!
//! Every value here is transient: it is created for one incoming query and
//! dropped once the answer has been produced.

use serde::Serialize;
use std::fmt;

/// A normalized search term derived from raw user input.
///
/// May be empty; an empty term never resolves to a target.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(term: impl Into<String>) -> Self {
        Self(term.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which table a resolved target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Journey,
    Service,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Journey => f.write_str("journey"),
            TargetKind::Service => f.write_str("service"),
        }
    }
}

/// The single journey or service a search term resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetEntity {
    pub id: i64,
    pub kind: TargetKind,
}

impl TargetEntity {
    pub fn journey(id: i64) -> Self {
        Self {
            id,
            kind: TargetKind::Journey,
        }
    }

    pub fn service(id: i64) -> Self {
        Self {
            id,
            kind: TargetKind::Service,
        }
    }
}

/// One flattened row of the service/entity/step/requirement join.
///
/// Columns that come from outer-joined tables are optional: a service with
/// no steps, or a step with no requirements, still produces a row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct JoinedRow {
    pub journey_id: Option<i64>,
    pub journey_name: Option<String>,
    pub service_id: i64,
    pub service_name: String,
    pub entity_name: String,
    pub entity_url: String,
    pub step_order: Option<i64>,
    pub step_description: Option<String>,
    pub requirement_name: Option<String>,
    pub requirement_source: Option<String>,
    pub requirement_required: Option<bool>,
}

/// How the final answer is grounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseMode {
    /// Retrieval returned rows; the answer must be built from them.
    Rag,
    /// Nothing was retrieved; a friendly generic reply is produced.
    General,
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseMode::Rag => f.write_str("RAG"),
            ResponseMode::General => f.write_str("GENERAL"),
        }
    }
}

/// Everything the pipeline decided for one query, before generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Retrieval {
    pub term: SearchTerm,
    pub target: Option<TargetEntity>,
    pub mode: ResponseMode,
    pub context: String,
}

/// The generated answer together with the retrieval that grounded it.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    #[serde(flatten)]
    pub retrieval: Retrieval,
    #[serde(rename = "answer")]
    pub text: String,
}
