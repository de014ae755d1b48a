//! HTTP server for the safety assistant.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ask` | Answer a chat message from the knowledge base |
//! | `POST` | `/send-message` | Resolve a message to raw section text |
//! | `GET`  | `/sections` | List indexed section keys |
//! | `GET`  | `/health` | Health check with version and knowledge state |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "message is required" } }
//! ```
//!
//! # Startup
//!
//! The knowledge file is loaded in the background. Requests arriving before
//! it is indexed are answered with the "not available" fallback, and
//! `/health` reports `"status": "pending"` for the knowledge base until then.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::assistant::{ask, AskReply, AskRequest};
use crate::config::Config;
use crate::knowledge::{FileSource, KnowledgeBase, LoadState};
use crate::resolve::ResolveOptions;

/// Starts the HTTP server on `[server].bind`.
///
/// Knowledge loading runs concurrently with serving; a load failure is
/// logged and leaves the server running with an empty knowledge base.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let kb = KnowledgeBase::new(ResolveOptions {
        strict_threshold: config.resolver.strict_threshold,
    });

    let source = FileSource::new(&config.knowledge.path);
    if !source.path().exists() {
        tracing::warn!(
            path = %source.path().display(),
            "knowledge file not found, answers disabled"
        );
    }
    let _loading = kb.spawn_initialize(Arc::new(source));

    let app = router(kb);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "tripsafe server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router over a shared knowledge base.
pub fn router(kb: KnowledgeBase) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ask", post(handle_ask))
        .route("/send-message", post(handle_send_message))
        .route("/sections", get(handle_sections))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(kb)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ POST /ask ============

/// Handler for `POST /ask`.
///
/// Returns the framed reply with tips, or 400 if the body is malformed or
/// the message is missing or empty.
async fn handle_ask(
    State(kb): State<KnowledgeBase>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskReply>, AppError> {
    let Json(req) = body.map_err(|e| bad_request(e.body_text()))?;
    let reply = ask(&kb, &req).map_err(|e| bad_request(e.to_string()))?;
    Ok(Json(reply))
}

// ============ POST /send-message ============

#[derive(Deserialize)]
struct SendMessageRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct SendMessageResponse {
    reply: String,
}

/// Handler for `POST /send-message`.
///
/// Returns the resolver output for the message as-is, with no emergency
/// framing and no tips. An empty message is resolved like any other.
async fn handle_send_message(
    State(kb): State<KnowledgeBase>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let Json(req) = body.map_err(|e| bad_request(e.body_text()))?;
    let message = req
        .message
        .ok_or_else(|| bad_request("message is required"))?;
    Ok(Json(SendMessageResponse {
        reply: kb.answer(&message),
    }))
}

// ============ GET /sections ============

#[derive(Serialize)]
struct SectionsResponse {
    knowledge: LoadState,
    sections: Vec<String>,
}

/// Handler for `GET /sections`.
///
/// Lists section keys in index order alongside the load state.
async fn handle_sections(State(kb): State<KnowledgeBase>) -> Json<SectionsResponse> {
    Json(SectionsResponse {
        knowledge: kb.state(),
        sections: kb.section_keys(),
    })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    knowledge: LoadState,
}

/// Handler for `GET /health`.
///
/// Always 200; the knowledge state says whether answers are available yet.
async fn handle_health(State(kb): State<KnowledgeBase>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        knowledge: kb.state(),
    })
}
