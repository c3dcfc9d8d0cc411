//! End-to-end tests of the query pipeline over the in-memory catalog.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use arshidni_core::assemble::NO_ROWS_PLACEHOLDER;
use arshidni_core::catalog::{
    Catalog, Entity, Journey, RequirementDefinition, Service, Step, StepRequirement,
};
use arshidni_core::error::{PipelineError, Result};
use arshidni_core::generation::TextGenerator;
use arshidni_core::models::{ResponseMode, TargetEntity};
use arshidni_core::normalize::QueryNormalizer;
use arshidni_core::pipeline::Pipeline;
use arshidni_core::router::{ResponseRouter, NO_DATA_SENTINEL};
use arshidni_core::store::memory::InMemoryCatalog;
use async_trait::async_trait;

// ─── Test Generator ─────────────────────────────────────────────────

/// Echoes a fixed answer and remembers every prompt it was given.
struct ScriptedGenerator {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl ScriptedGenerator {
    fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _model: &str, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(PipelineError::generation("HTTP 503 Service Unavailable"));
        }
        Ok("تم.".to_string())
    }
}

// ─── Fixture ────────────────────────────────────────────────────────

fn catalog() -> Catalog {
    Catalog {
        entities: vec![
            Entity {
                id: 1,
                name: "المديرية العامة للمرور".into(),
                url: "https://www.moi.gov.sa/traffic".into(),
            },
            Entity {
                id: 2,
                name: "وزارة الشؤون البلدية".into(),
                url: "https://balady.gov.sa".into(),
            },
        ],
        services: vec![
            Service {
                id: 10,
                entity_id: 1,
                name: "تجديد رخصة القيادة".into(),
                keyword: Some("تجديد رخصة".into()),
            },
            Service {
                id: 20,
                entity_id: 2,
                name: "إصدار رخصة بناء".into(),
                keyword: None,
            },
            Service {
                id: 21,
                entity_id: 2,
                name: "شهادة إشغال منزل".into(),
                keyword: None,
            },
        ],
        journeys: vec![Journey {
            id: 1,
            name: "رحلة بناء منزل".into(),
            keyword: Some("بناء منزل".into()),
            services: vec![20, 21],
        }],
        steps: vec![
            Step {
                id: 100,
                service_id: 10,
                order: 1,
                description: "الدخول إلى منصة أبشر".into(),
            },
            Step {
                id: 101,
                service_id: 10,
                order: 2,
                description: "سداد الرسوم".into(),
            },
            Step {
                id: 200,
                service_id: 20,
                order: 1,
                description: "تقديم الطلب عبر بلدي".into(),
            },
            Step {
                id: 210,
                service_id: 21,
                order: 1,
                description: "طلب المعاينة".into(),
            },
        ],
        requirements: vec![
            RequirementDefinition {
                id: 1,
                display_name: "صورة الهوية".into(),
                source_type: Some("أبشر".into()),
            },
            RequirementDefinition {
                id: 2,
                display_name: "صك الملكية".into(),
                source_type: Some("وزارة العدل".into()),
            },
        ],
        step_requirements: vec![
            StepRequirement {
                id: 1,
                step_id: 100,
                requirement_id: 1,
                required: true,
            },
            StepRequirement {
                id: 2,
                step_id: 200,
                requirement_id: 2,
                required: true,
            },
            StepRequirement {
                id: 3,
                step_id: 200,
                requirement_id: 1,
                required: false,
            },
        ],
    }
}

fn pipeline(store: Arc<InMemoryCatalog>, generator: Arc<ScriptedGenerator>) -> Pipeline {
    Pipeline::new(
        QueryNormalizer::plain(),
        store,
        generator,
        ResponseRouter::new("test-model", 12_000),
    )
}

// ─── Scenarios ──────────────────────────────────────────────────────

#[tokio::test]
async fn license_renewal_is_answered_from_data() {
    let store = Arc::new(InMemoryCatalog::new(catalog()));
    let generator = Arc::new(ScriptedGenerator::ok());
    let p = pipeline(store, generator.clone());

    let answer = p.answer("تجديد رخصة").await.unwrap();
    let r = &answer.retrieval;

    assert_eq!(r.mode, ResponseMode::Rag);
    assert_eq!(r.target, Some(TargetEntity::service(10)));
    assert_eq!(r.context.matches("--- [خدمة:").count(), 1);
    assert!(r.context.contains("الخطوة 1: الدخول إلى منصة أبشر"));
    assert!(r.context.contains("صورة الهوية (إلزامي - المصدر: أبشر)"));
    assert!(r
        .context
        .contains("الخطوة 2: سداد الرسوم\nالمتطلبات التفصيلية: لا يوجد."));
    assert_eq!(answer.text, "تم.");
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn greeting_falls_back_to_general() {
    let store = Arc::new(InMemoryCatalog::new(catalog()));
    let generator = Arc::new(ScriptedGenerator::ok());
    let p = pipeline(store, generator.clone());

    let answer = p.answer("  أهلاً ").await.unwrap();
    assert_eq!(answer.retrieval.mode, ResponseMode::General);
    assert_eq!(answer.retrieval.target, None);
    assert_eq!(answer.retrieval.context, NO_DATA_SENTINEL);
    assert_ne!(answer.retrieval.context, NO_ROWS_PLACEHOLDER);

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"  أهلاً \""));
}

#[tokio::test]
async fn journey_groups_services_in_journey_order() {
    let store = Arc::new(InMemoryCatalog::new(catalog()));
    let p = pipeline(store, Arc::new(ScriptedGenerator::ok()));

    let r = p.retrieve("بناء منزل").await;
    assert_eq!(r.target, Some(TargetEntity::journey(1)));
    assert!(r.context.contains("لـ: رحلة بناء منزل"));

    let first = r.context.find("[خدمة: إصدار رخصة بناء]").unwrap();
    let second = r.context.find("[خدمة: شهادة إشغال منزل]").unwrap();
    assert!(first < second);
    assert!(r
        .context
        .contains("صك الملكية (إلزامي - المصدر: وزارة العدل) | صورة الهوية (اختياري - المصدر: أبشر)"));
}

#[tokio::test]
async fn repeated_queries_produce_identical_context() {
    let store = Arc::new(InMemoryCatalog::new(catalog()));
    let p = pipeline(store, Arc::new(ScriptedGenerator::ok()));

    let a = p.retrieve("بناء منزل").await;
    let b = p.retrieve("بناء منزل").await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn store_outage_looks_like_no_match() {
    let store = Arc::new(InMemoryCatalog::new(catalog()));
    store.set_offline(true);
    let generator = Arc::new(ScriptedGenerator::ok());
    let p = pipeline(store, generator.clone());

    let answer = p.answer("تجديد رخصة").await.unwrap();
    assert_eq!(answer.retrieval.mode, ResponseMode::General);
    assert_eq!(answer.retrieval.context, NO_DATA_SENTINEL);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn generation_failure_is_shown_to_the_user() {
    let store = Arc::new(InMemoryCatalog::new(catalog()));
    let generator = Arc::new(ScriptedGenerator::failing());
    let p = pipeline(store, generator.clone());

    assert!(matches!(
        p.answer("تجديد رخصة").await,
        Err(PipelineError::Generation(_))
    ));

    let text = p.reply("تجديد رخصة").await;
    assert!(text.starts_with("❌"));
    assert!(text.contains("503"));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn one_session_per_query_and_always_released() {
    let store = Arc::new(InMemoryCatalog::new(catalog()));
    let p = pipeline(store.clone(), Arc::new(ScriptedGenerator::ok()));

    p.retrieve("تجديد رخصة").await;
    p.retrieve("أهلاً").await;
    p.retrieve("").await;

    assert_eq!(store.sessions_opened(), 3);
    assert_eq!(store.sessions_live(), 0);
}
