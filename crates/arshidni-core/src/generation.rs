//! Text-generation collaborator contract.

use async_trait::async_trait;

use crate::error::Result;

/// Turns a prompt into prose using a named model.
///
/// Implementations make exactly one request per call and never retry.
/// Failures are reported as
/// [`PipelineError::Generation`](crate::error::PipelineError::Generation).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name for logs (e.g. `"gemini"`).
    fn name(&self) -> &str;

    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}
