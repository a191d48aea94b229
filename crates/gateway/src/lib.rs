//! HTTP API gateway for Agentry.
//!
//! Exposes the runtime's whole surface:
//! - liveness/readiness probes for the orchestrator
//! - the agent discovery card (`/.well-known/agent`, `/agent/card`)
//! - task invocation (`POST /agent/invoke`) and direct delegation
//!   (`POST /agent/delegate`)
//! - memory inspection (`GET /memory/events`, `GET /memory/sessions`)
//!
//! Built on Axum. All shared instances are constructed once at startup and
//! injected through `AppState`; request handlers never reach for globals.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use agentry_agent::ReasoningLoop;
use agentry_config::RuntimeConfig;
use agentry_core::error::DelegationError;
use agentry_core::peer::{AgentCard, PeerRouter};
use agentry_core::store::SessionStore;
use agentry_core::tool::ToolSource;

/// Shared application state, built once in `serve()` (or by tests).
pub struct AppState {
    pub agent_name: String,
    pub agent_description: String,
    pub agent: Arc<ReasoningLoop>,
    pub store: Arc<dyn SessionStore>,
    pub tools: Vec<Arc<dyn ToolSource>>,
    pub peers: Arc<dyn PeerRouter>,
    pub request_timeout: Duration,
}

type SharedState = Arc<AppState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/.well-known/agent", get(card_handler))
        .route("/agent/card", get(card_handler))
        .route("/agent/invoke", post(invoke_handler))
        .route("/agent/delegate", post(delegate_handler))
        .route("/memory/events", get(memory_events_handler))
        .route("/memory/sessions", get(memory_sessions_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the full instance graph from configuration and run the server
/// until SIGINT/SIGTERM.
pub async fn serve(config: RuntimeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = agentry_memory::store_from_config(&config);
    let model = agentry_providers::model_from_config(&config);
    let tools = agentry_tools::tool_sources_from_config(&config);
    let peers = agentry_peers::router_from_config(&config);

    let agent = Arc::new(
        ReasoningLoop::new(
            model,
            store.clone(),
            tools.clone(),
            peers.clone(),
            &config.agent_instructions,
        )
        .with_max_steps(config.max_reasoning_steps)
        .with_context_window(config.context_window_size)
        .with_app_name(&config.agent_name),
    );

    let state = Arc::new(AppState {
        agent_name: config.agent_name.clone(),
        agent_description: config.agent_description.clone(),
        agent,
        store,
        tools,
        peers,
        request_timeout: Duration::from_secs(config.request_timeout_secs),
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, agent = %config.agent_name, "Gateway starting");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

// --- Probes ---

#[derive(Serialize)]
struct ProbeResponse {
    status: &'static str,
    name: String,
}

async fn health_handler(State(state): State<SharedState>) -> Json<ProbeResponse> {
    Json(ProbeResponse { status: "healthy", name: state.agent_name.clone() })
}

async fn ready_handler(State(state): State<SharedState>) -> Json<ProbeResponse> {
    Json(ProbeResponse { status: "ready", name: state.agent_name.clone() })
}

// --- Agent card ---

async fn card_handler(State(state): State<SharedState>) -> Json<AgentCard> {
    let mut skills = Vec::new();
    for source in &state.tools {
        for tool in source.list_tools().await {
            skills.push(serde_json::json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }));
        }
    }

    let mut capabilities = vec!["message_processing".to_string(), "task_execution".to_string()];
    if !state.tools.is_empty() {
        capabilities.push("tool_execution".into());
    }
    if !state.peers.peer_summaries().await.is_empty() {
        capabilities.push("task_delegation".into());
    }

    Json(AgentCard {
        name: state.agent_name.clone(),
        description: state.agent_description.clone(),
        url: String::new(),
        skills,
        capabilities,
    })
}

// --- Invocation ---

#[derive(Deserialize)]
struct InvokeRequest {
    task: String,
    /// Bounded context summary supplied by a delegating peer.
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct InvokeResponse {
    result: String,
    session_id: String,
    terminal_reason: agentry_core::TerminalReason,
    steps: u32,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn invoke_handler(
    State(state): State<SharedState>,
    Json(request): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.task.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse { error: "task must not be empty".into() }),
        ));
    }

    // A delegating peer's context rides along as part of the task text.
    let task = match &request.context {
        Some(context) if !context.trim().is_empty() => format!(
            "{}\n\nContext from the requesting agent:\n{context}",
            request.task
        ),
        _ => request.task.clone(),
    };

    let invocation = state.agent.run(&task, request.session_id);

    match tokio::time::timeout(state.request_timeout, invocation).await {
        Ok(Ok(outcome)) => Ok(Json(InvokeResponse {
            result: outcome.response,
            session_id: outcome.session_id,
            terminal_reason: outcome.terminal_reason,
            steps: outcome.steps,
        })),
        Ok(Err(e)) => {
            error!(error = %e, "Task invocation failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse { error: e.to_string() }),
            ))
        }
        Err(_) => {
            // Deadline expired while suspended on a remote call. The
            // invocation future is dropped here; events already appended
            // stay visible through the memory endpoints.
            warn!(timeout_secs = state.request_timeout.as_secs(), "Request deadline exceeded");
            Err((
                StatusCode::GATEWAY_TIMEOUT,
                Json(ErrorResponse { error: "request deadline exceeded".into() }),
            ))
        }
    }
}

// --- Direct delegation ---

#[derive(Deserialize)]
struct DelegateRequest {
    agent: String,
    task: String,
}

#[derive(Serialize)]
struct DelegateResponse {
    result: String,
}

async fn delegate_handler(
    State(state): State<SharedState>,
    Json(request): Json<DelegateRequest>,
) -> Result<Json<DelegateResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.peers.delegate(&request.agent, &request.task, None).await {
        Ok(result) => Ok(Json(DelegateResponse { result })),
        Err(e @ DelegationError::UnknownPeer(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse { error: e.to_string() }),
        )),
        Err(e) => {
            warn!(error = %e, "Direct delegation failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse { error: e.to_string() }),
            ))
        }
    }
}

// --- Memory inspection ---

const DEFAULT_EVENT_LIMIT: usize = 100;
const MAX_EVENT_LIMIT: usize = 1000;

#[derive(Deserialize)]
struct MemoryEventsQuery {
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct MemoryEventsResponse {
    agent: String,
    events: Vec<serde_json::Value>,
    total: usize,
}

async fn memory_events_handler(
    State(state): State<SharedState>,
    Query(query): Query<MemoryEventsQuery>,
) -> Json<MemoryEventsResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT).clamp(1, MAX_EVENT_LIMIT);

    // (session_id, event) pairs, oldest first.
    let mut tagged = Vec::new();
    match &query.session_id {
        Some(session_id) => {
            for event in state.store.get_session_events(session_id, None).await {
                tagged.push((session_id.clone(), event));
            }
        }
        None => {
            for summary in state.store.list_sessions(None).await {
                for event in state.store.get_session_events(&summary.session_id, None).await {
                    tagged.push((summary.session_id.clone(), event));
                }
            }
            tagged.sort_by_key(|(_, e)| e.timestamp);
        }
    }

    let start = tagged.len().saturating_sub(limit);
    let events: Vec<serde_json::Value> = tagged[start..]
        .iter()
        .map(|(session_id, event)| {
            let mut value = serde_json::to_value(event).unwrap_or_default();
            if let Some(object) = value.as_object_mut() {
                object.insert("session_id".into(), serde_json::json!(session_id));
            }
            value
        })
        .collect();

    let total = events.len();
    Json(MemoryEventsResponse { agent: state.agent_name.clone(), events, total })
}

#[derive(Serialize)]
struct MemorySessionsResponse {
    agent: String,
    sessions: Vec<String>,
    total: usize,
}

async fn memory_sessions_handler(
    State(state): State<SharedState>,
) -> Json<MemorySessionsResponse> {
    let sessions: Vec<String> = state
        .store
        .list_sessions(None)
        .await
        .into_iter()
        .map(|s| s.session_id)
        .collect();
    let total = sessions.len();
    Json(MemorySessionsResponse { agent: state.agent_name.clone(), sessions, total })
}
