//! MCP-compatible HTTP server forwarding queries to the vector store.
//!
//! Exposes the knowledge-base query as a tool over a JSON HTTP API suitable
//! for integration with Cursor, Claude, and other MCP-compatible AI tools.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List the available tools with schemas |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients and cross-origin MCP tool calls.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::query::format_grouped;
use crate::store::VectorStore;

/// Name of the single knowledge-base query tool.
const TOOL_GET_KB: &str = "get_kb";

/// Default result count when the caller does not pass one.
const DEFAULT_RESULTS: usize = 3;

#[derive(Clone)]
struct AppState {
    store: Arc<dyn VectorStore>,
}

/// Start the HTTP server on the configured bind address.
///
/// Runs until the process is terminated. The store handle was already
/// connected and validated by the caller.
pub async fn run_server(config: &Config, store: Arc<dyn VectorStore>) -> anyhow::Result<()> {
    let state = AppState { store };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("MCP server listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
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

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

fn get_kb_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Free-text query against the knowledge base"
            },
            "count": {
                "type": "integer",
                "description": "Number of passages to return",
                "default": DEFAULT_RESULTS
            }
        },
        "required": ["query"]
    })
}

async fn handle_list_tools() -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: vec![ToolInfo {
            name: TOOL_GET_KB.to_string(),
            description: "Query the knowledge base and return matching passages grouped by source file".to_string(),
            parameters: get_kb_schema(),
        }],
    })
}

// ============ POST /tools/{name} ============

async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    if name != TOOL_GET_KB {
        return Err(not_found(format!("no tool registered with name: {}", name)));
    }

    let query = params
        .get("query")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    if query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let count = params
        .get("count")
        .and_then(serde_json::Value::as_u64)
        .map(|c| c as usize)
        .unwrap_or(DEFAULT_RESULTS);

    let hits = state
        .store
        .query(query, count)
        .await
        .map_err(|e| tool_error(format!("{}: {}", TOOL_GET_KB, e)))?;

    Ok(Json(
        serde_json::json!({ "result": format_grouped(&hits) }),
    ))
}
