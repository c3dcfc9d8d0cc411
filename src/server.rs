//! HTTP surface for the query pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ask` | Answer a query (one generation call) |
//! | `POST` | `/context` | Retrieval only: term, target, mode, context |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `generation_failed` (502). Store
//! failures are not errors here: they produce a normal `GENERAL` answer.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use arshidni_core::models::Answer;
use arshidni_core::pipeline::Pipeline;
use arshidni_core::router::user_facing_error;

use crate::ask::build_pipeline;
use crate::config::Config;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

fn error_response(status: StatusCode, code: &'static str, message: String) -> Response {
    (
        status,
        Json(ErrorBody {
            error: ErrorDetail { code, message },
        }),
    )
        .into_response()
}

/// Build the router around an existing pipeline.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ask", post(handle_ask))
        .route("/context", post(handle_context))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { pipeline })
}

/// `arshidni serve` — bind to `[server].bind` and serve until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pipeline = Arc::new(build_pipeline(config)?);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "listening");
    eprintln!("Arshidni server listening on http://{}", config.server.bind);
    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}

async fn handle_ask(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Response {
    if req.query.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "bad_request",
            "query must not be empty".to_string(),
        );
    }

    match state.pipeline.answer(&req.query).await {
        Ok(answer) => Json::<Answer>(answer).into_response(),
        Err(e) => {
            warn!(error = %e, "generation failed");
            error_response(StatusCode::BAD_GATEWAY, "generation_failed", user_facing_error(&e))
        }
    }
}

async fn handle_context(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Response {
    Json(state.pipeline.retrieve(&req.query).await).into_response()
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
