// HTTP surface for the web UI.
//
// POST /api/check  {"file": ...} -> {"allowed", "reason"?}
// POST /api/run    {"file": ...} -> {"success", "pid", "file", "vfsPath"} | {"error"}
// GET  /api/status                -> uptime and whether launching is enabled

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use execgate_core::{Credentials, RequestId};

use crate::service::{CheckResponse, ExecService, RunResponse};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ExecService>,
    pub started_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct FileRequest {
    pub file: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub started_at: String,
    pub uptime_seconds: u64,
    pub enabled: bool,
}

impl AppState {
    pub fn new(service: ExecService) -> Self {
        Self {
            service: Arc::new(service),
            started_at: OffsetDateTime::now_utc(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/check", post(check_handler))
        .route("/api/run", post(run_handler))
        .route("/api/status", get(status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(listen: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("bind {listen}"))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn credentials(headers: &HeaderMap) -> Credentials {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| Credentials::Bearer(token.to_string()))
        .unwrap_or(Credentials::Anonymous)
}

async fn check_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> Json<CheckResponse> {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return Json(CheckResponse::denied(rejection.body_text())),
    };
    let credentials = credentials(&headers);
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || {
        service.check(RequestId::new(), &credentials, &body.file)
    })
    .await;
    Json(result.unwrap_or_else(|err| {
        error!("check task failed: {}", err);
        CheckResponse::denied("internal error")
    }))
}

async fn run_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> Json<RunResponse> {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return Json(RunResponse::failed(rejection.body_text())),
    };
    let credentials = credentials(&headers);
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || {
        service.run(RequestId::new(), &credentials, &body.file)
    })
    .await;
    Json(result.unwrap_or_else(|err| {
        error!("run task failed: {}", err);
        RunResponse::failed("internal error")
    }))
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let uptime = OffsetDateTime::now_utc() - state.started_at;
    Json(StatusResponse {
        started_at: state.started_at.format(&Rfc3339).unwrap_or_default(),
        uptime_seconds: uptime.whole_seconds().max(0) as u64,
        enabled: state.service.is_enabled(),
    })
}
