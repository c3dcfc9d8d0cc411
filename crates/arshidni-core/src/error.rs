//! Error taxonomy for the query pipeline.
//!
//! "Nothing matched" is not an error: resolution returns `Option::None`.
//! Store errors are downgraded to an empty retrieval by the pipeline;
//! only [`PipelineError::Generation`] ever reaches the end user.

/// Failures raised by pipeline collaborators.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The catalog store could not be reached.
    #[error("store connection error: {0}")]
    StoreConnection(String),

    /// A lookup or join query failed after a connection was acquired.
    #[error("store query error: {0}")]
    StoreQuery(String),

    /// The text-generation service failed or returned an unusable response.
    #[error("generation service error: {0}")]
    Generation(String),

    /// The keyword extractor failed; callers fall back to the raw input.
    #[error("keyword extraction error: {0}")]
    KeywordExtraction(String),
}

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn connection(err: impl std::fmt::Display) -> Self {
        Self::StoreConnection(err.to_string())
    }

    pub fn query(err: impl std::fmt::Display) -> Self {
        Self::StoreQuery(err.to_string())
    }

    pub fn generation(err: impl std::fmt::Display) -> Self {
        Self::Generation(err.to_string())
    }

    pub fn extraction(err: impl std::fmt::Display) -> Self {
        Self::KeywordExtraction(err.to_string())
    }

    /// True for the store failures the pipeline downgrades to "no rows".
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreConnection(_) | Self::StoreQuery(_))
    }
}
