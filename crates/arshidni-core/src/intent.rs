//! LLM-backed intent classification.
//!
//! Labels a query as a service question or general chat. The pipeline does
//! not call this: response mode is decided from retrieval alone. It is
//! exposed for diagnostics (`arshidni classify`).

use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::generation::TextGenerator;

/// What the user is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    ServiceQuery,
    GeneralChat,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::ServiceQuery => f.write_str("SERVICE_QUERY"),
            Intent::GeneralChat => f.write_str("GENERAL_CHAT"),
        }
    }
}

impl Intent {
    /// Interpret a generator answer. Anything that is not clearly
    /// `GENERAL_CHAT` counts as a service query.
    pub fn from_label(label: &str) -> Self {
        if label.trim().to_ascii_uppercase().contains("GENERAL_CHAT") {
            Intent::GeneralChat
        } else {
            Intent::ServiceQuery
        }
    }
}

fn classification_prompt(query: &str) -> String {
    format!(
        r#"اقرأ الجملة التالية. حدد هدف المستخدم الرئيسي بدقة:
- إذا كانت الجملة سؤالاً عن خدمة حكومية أو خطوة أو متطلب أو إجراء (مثل "تجديد رخصة" أو "كيف أبني منزل؟")، أجب بـ SERVICE_QUERY فقط.
- إذا كانت الجملة ترحيباً أو شكراً أو عبارة عامة لا علاقة لها بالخدمات (مثل "أهلاً" أو "شكراً لك" أو "كيف حالك؟")، أجب بـ GENERAL_CHAT فقط.

جملة المستخدم: "{query}"
النية:"#
    )
}

/// Classify `query` with one generation call; failures default to
/// [`Intent::ServiceQuery`].
pub async fn classify_intent(generator: &dyn TextGenerator, model: &str, query: &str) -> Intent {
    match generator.generate(model, &classification_prompt(query)).await {
        Ok(label) => Intent::from_label(&label),
        Err(e) => {
            warn!(error = %e, "intent classification failed");
            Intent::ServiceQuery
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, Result};
    use async_trait::async_trait;

    struct Answers(Result<&'static str>);

    #[async_trait]
    impl TextGenerator for Answers {
        fn name(&self) -> &str {
            "answers"
        }
        async fn generate(&self, _model: &str, prompt: &str) -> Result<String> {
            assert!(prompt.contains("جملة المستخدم"));
            match &self.0 {
                Ok(s) => Ok(s.to_string()),
                Err(e) => Err(PipelineError::generation(e)),
            }
        }
    }

    #[test]
    fn labels_parse_leniently() {
        assert_eq!(Intent::from_label(" general_chat\n"), Intent::GeneralChat);
        assert_eq!(Intent::from_label("SERVICE_QUERY"), Intent::ServiceQuery);
        assert_eq!(Intent::from_label("maybe?"), Intent::ServiceQuery);
    }

    #[tokio::test]
    async fn failures_default_to_service_query() {
        let generator = Answers(Err(PipelineError::generation("down")));
        assert_eq!(classify_intent(&generator, "m", "أهلاً").await, Intent::ServiceQuery);

        let generator = Answers(Ok("GENERAL_CHAT"));
        assert_eq!(classify_intent(&generator, "m", "أهلاً").await, Intent::GeneralChat);
    }
}
