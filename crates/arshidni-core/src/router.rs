//! Response-mode selection and prompt construction.
//!
//! The router decides between a retrieval-grounded answer ([`ResponseMode::Rag`])
//! and a generic conversational one ([`ResponseMode::General`]) purely from
//! whether retrieval produced rows. It then builds the mode's instruction
//! template around the literal user query and the context, and performs
//! exactly one generation call.

use tracing::{debug, info};

use crate::assemble::assemble;
use crate::error::{PipelineError, Result};
use crate::generation::TextGenerator;
use crate::models::{JoinedRow, ResponseMode, TargetKind};

/// Context handed to the generator when nothing was retrieved.
///
/// Distinct from [`NO_ROWS_PLACEHOLDER`](crate::assemble::NO_ROWS_PLACEHOLDER):
/// this one means retrieval never produced anything to assemble.
pub const NO_DATA_SENTINEL: &str =
    "لا تتوفر أي بيانات محددة لهذه الكلمات المفتاحية في قاعدة البيانات الحكومية.";

/// Appended when the context had to be cut to fit `max_context_chars`.
const TRUNCATION_MARKER: &str = "\n[... تم اختصار السياق ...]";

/// Default cap on context characters embedded in a prompt.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;

/// The context and mode chosen for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub mode: ResponseMode,
    pub context: String,
}

/// Chooses the response mode and drives the single generation call.
#[derive(Debug, Clone)]
pub struct ResponseRouter {
    model: String,
    max_context_chars: usize,
}

impl ResponseRouter {
    pub fn new(model: impl Into<String>, max_context_chars: usize) -> Self {
        Self {
            model: model.into(),
            max_context_chars: max_context_chars.max(1),
        }
    }

    /// Pick the mode. The assembler is only consulted when there are rows.
    pub fn route(&self, rows: &[JoinedRow], kind: Option<TargetKind>) -> Routed {
        match kind {
            Some(kind) if !rows.is_empty() => Routed {
                mode: ResponseMode::Rag,
                context: assemble(rows, kind).render(),
            },
            _ => Routed {
                mode: ResponseMode::General,
                context: NO_DATA_SENTINEL.to_string(),
            },
        }
    }

    /// Build the mode-specific prompt around `query` and the (possibly
    /// truncated) context.
    pub fn prompt(&self, query: &str, routed: &Routed) -> String {
        let context = truncate_chars(&routed.context, self.max_context_chars);
        match routed.mode {
            ResponseMode::Rag => rag_prompt(query, &context),
            ResponseMode::General => general_prompt(query, &context),
        }
    }

    /// Perform the one generation call for this query.
    pub async fn respond(
        &self,
        generator: &dyn TextGenerator,
        query: &str,
        routed: &Routed,
    ) -> Result<String> {
        let prompt = self.prompt(query, routed);
        debug!(
            generator = generator.name(),
            model = %self.model,
            mode = %routed.mode,
            prompt_chars = prompt.chars().count(),
            "sending prompt"
        );
        let text = generator.generate(&self.model, &prompt).await?;
        info!(mode = %routed.mode, "answer generated");
        Ok(text.trim().to_string())
    }
}

impl Default for ResponseRouter {
    fn default() -> Self {
        Self::new("gemini-2.5-flash", DEFAULT_MAX_CONTEXT_CHARS)
    }
}

/// The message shown to the user when generation itself failed.
pub fn user_facing_error(err: &PipelineError) -> String {
    match err {
        PipelineError::Generation(msg) => format!("❌ خطأ في خدمة توليد النص: {}", msg),
        other => format!("❌ خطأ عام: {}", other),
    }
}

/// Cut `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn rag_prompt(query: &str, context: &str) -> String {
    format!(
        r#"أنت روبوت "أرشدني" المتخصص في الخدمات الحكومية السعودية. مهمتك هي قراءة السياق التالي واستخدامه حصراً لتوليد رد للمستخدم.

التنسيق الإلزامي:
1. يجب أن يكون الرد في شكل **قوائم رقمية** منظمة حسب **الجهة الحكومية**.
2. تحت كل جهة، أدرج **نقاطاً أبجدية (أ/ب/ج)** تمثل الخطوات الرئيسية المتعلقة بالجهة.
3. ضع **رابط الجهة** في نهاية قائمة كل جهة.
4. في النهاية، أضف سؤالاً ختامياً للمستخدم للتفاعل.
5. إذا احتوى سؤال المستخدم على كلمات غير مرتبطة بالخدمة (مثل "عندي استفسار بخصوص")، تجاهلها وركز على الكلمات المفتاحية للخدمة.

السؤال الأصلي للمستخدم: "{query}"
السياق المستخرج من قاعدة البيانات:
---
{context}
---
**ابدأ الرد مباشرة بالتنسيق المطلوب.**"#
    )
}

fn general_prompt(query: &str, context: &str) -> String {
    format!(
        r#"أنت روبوت "أرشدني" الودود. لم يعثر نظام البحث في قاعدة البيانات الحكومية على خدمة تطابق "{query}".

إذا كان كلام المستخدم تحية أو شكراً (مثل "أهلاً" أو "شكراً")، فرد بلطف.
إذا كان كلام المستخدم استفساراً عن خدمة ولم تجدها في السياق، فاعتذر بلطف واطلب منه تجربة كلمة مفتاحية أخرى.

السياق (ملاحظة: لا يحتوي على بيانات خدمة):
---
{context}
---
الرد المطلوب:"#
    )
}
