//! HTTP surface tests against an in-process server on an ephemeral port.

use std::path::Path;
use std::sync::Arc;

use arshidni::generation::DisabledGenerator;
use arshidni::import::load_catalog;
use arshidni::server::router;
use arshidni_core::normalize::QueryNormalizer;
use arshidni_core::pipeline::Pipeline;
use arshidni_core::router::ResponseRouter;
use arshidni_core::store::memory::InMemoryCatalog;
use serde_json::{json, Value};

async fn spawn_server() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/catalog.toml");
    let store = Arc::new(InMemoryCatalog::new(load_catalog(&path).unwrap()));
    let pipeline = Pipeline::new(
        QueryNormalizer::plain(),
        store,
        Arc::new(DisabledGenerator),
        ResponseRouter::default(),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(Arc::new(pipeline))).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn health_reports_version() {
    let base = spawn_server().await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn context_endpoint_skips_generation() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/context", base))
        .json(&json!({ "query": "تجديد رخصة" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["mode"], "RAG");
    assert_eq!(body["target"]["kind"], "service");
    assert_eq!(body["target"]["id"], 10);
    assert!(body.get("answer").is_none());
}

#[tokio::test]
async fn ask_rejects_empty_query() {
    let base = spawn_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{}/ask", base))
        .json(&json!({ "query": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn ask_surfaces_generation_failure_as_bad_gateway() {
    let base = spawn_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{}/ask", base))
        .json(&json!({ "query": "أهلاً" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "generation_failed");
    assert!(body["error"]["message"].as_str().unwrap().starts_with("❌"));
}
