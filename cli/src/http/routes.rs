//! HTTP route handlers

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use buildd_core::api::{DependencyRequest, OutboundEvent, ReplyRx, RunTaskRequest};
use chrono::Local;
use futures::Stream;

use crate::http::{models::*, state::AppState, validation::cancel_key};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/tasks/run", post(run_task_handler))
        .route("/api/v1/dependencies", post(dependencies_handler))
        .route("/api/v1/cancel", post(cancel_handler))
        .route("/api/v1/cancel-all", post(cancel_all_handler))
        .route("/health", get(health_handler))
        .route("/api/v1/shutdown", post(shutdown_handler))
        .with_state(state)
}

/// POST /api/v1/tasks/run - run one task, streaming its events
async fn run_task_handler(
    State(state): State<AppState>,
    Json(req): Json<RunTaskRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    state.record_request("/api/v1/tasks/run");

    let (tx, rx) = state.ctx.reply_channel();
    let tasks = state.ctx.tasks();
    // The run outlives the response stream when the client goes away.
    tokio::spawn(async move {
        tasks.run(req, tx).await;
    });

    Sse::new(event_stream(rx)).keep_alive(KeepAlive::default())
}

/// POST /api/v1/dependencies - resolve the dependency forest of a build
async fn dependencies_handler(
    State(state): State<AppState>,
    Json(req): Json<DependencyRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    state.record_request("/api/v1/dependencies");

    let (tx, rx) = state.ctx.reply_channel();
    let dependencies = state.ctx.dependencies();
    tokio::spawn(async move {
        dependencies.query(req, tx).await;
    });

    Sse::new(event_stream(rx)).keep_alive(KeepAlive::default())
}

/// POST /api/v1/cancel - cancel one in-flight operation
async fn cancel_handler(
    State(state): State<AppState>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<CancelResponse>, HttpServerError> {
    state.record_request("/api/v1/cancel");

    let key = cancel_key(&req).inspect_err(|_| state.record_error())?;
    let found = state.ctx.registry().cancel(&key);

    Ok(Json(CancelResponse {
        success: true,
        found,
        key: key.to_string(),
    }))
}

/// POST /api/v1/cancel-all - cancel every in-flight operation
async fn cancel_all_handler(State(state): State<AppState>) -> Json<CancelAllResponse> {
    state.record_request("/api/v1/cancel-all");

    Json(CancelAllResponse {
        success: true,
        cancelled: state.ctx.registry().cancel_all(),
    })
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.stats.read().unwrap_or_else(|e| e.into_inner());
    let operations: Vec<String> = state
        .ctx
        .registry()
        .keys()
        .iter()
        .map(ToString::to_string)
        .collect();

    Json(HealthResponse {
        status: "healthy".into(),
        session_id: state.session_id.clone(),
        uptime_seconds: stats.uptime_seconds(),
        requests_handled: stats.requests_total,
        in_flight: operations.len(),
        operations,
        timestamp: Local::now().to_rfc3339(),
    })
}

/// POST /api/v1/shutdown
async fn shutdown_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let _ = state.shutdown_tx.send(());

    Json(serde_json::json!({
        "success": true,
        "message": "Shutdown signal sent"
    }))
}

/// SSE stream of one reply channel. Ends after the terminal result.
fn event_stream(mut rx: ReplyRx) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(ev) = rx.recv().await {
            let last = ev.is_result();
            match sse_event(&ev) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::error!(event = ev.name(), error = %e, "failed to encode event"),
            }
            if last {
                break;
            }
        }
    }
}

fn sse_event(ev: &OutboundEvent) -> serde_json::Result<Event> {
    Ok(Event::default().event(ev.name()).data(ev.data_json()?))
}
