//! HTTP front door.
//!
//! Four routes: `POST /query` runs the guarded pipeline, `GET /health`
//! reports liveness without queueing behind it, `GET /tools` publishes the
//! callable tool definitions, and `POST /tools/{name}` invokes one tool
//! directly (unguarded, so direct calls may run concurrently).
//!
//! `/query` always answers HTTP 200 with a valid `QueryResult`; failures
//! travel inside the Result, not as error statuses.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::agent::RunGuard;
use crate::assemble::direct_answer_result;
use crate::tools::{ToolDefinition, ToolRouter};
use crate::types::{QueryResult, ToolOutcome};

#[derive(Clone)]
pub struct AppState {
    guard: Arc<RunGuard>,
    tools: Arc<ToolRouter>,
    model: String,
}

impl AppState {
    pub fn new(guard: Arc<RunGuard>, tools: Arc<ToolRouter>, model: String) -> Self {
        Self {
            guard,
            tools,
            model,
        }
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The question to route. Defaults to empty so a bare `{}` body gets
    /// the `empty_input` answer instead of a 422.
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub model: String,
    #[serde(rename = "agentAvailable")]
    pub agent_available: bool,
}

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolDefinition>,
}

// --- Handlers ---

async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResult> {
    let span = info_span!("query", request_id = %Uuid::new_v4());
    async move {
        let question = request.question.trim();
        info!(question, "query received");

        if question.is_empty() {
            return Json(direct_answer_result(
                "Please provide a question.",
                "empty_input",
                false,
            ));
        }

        let result = state.guard.run(question).await;
        info!(tool = %result.tool, "query answered");
        Json(result)
    }
    .instrument(span)
    .await
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        model: state.model.clone(),
        agent_available: state.guard.is_available().await,
    })
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.tools.definitions(),
    })
}

async fn handle_call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(args): Json<Map<String, Value>>,
) -> Json<ToolOutcome> {
    info!(tool = %name, "direct tool invocation");
    Json(state.tools.dispatch_named(&name, &args).await)
}

// --- Wiring ---

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/query", post(handle_query))
        .route("/health", get(handle_health))
        .route("/tools", get(handle_list_tools))
        .route("/tools/{name}", post(handle_call_tool))
}

pub async fn start_server(
    bind: &str,
    state: AppState,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let app = create_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(addr = bind, "curiobot listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!("shutting down HTTP server");
}
