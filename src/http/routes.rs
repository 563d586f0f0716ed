use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{ErrorReport, FrameReport, ResetReport};
use crate::error::{ErrorCategory, ErrorCode, FrameError, SessionError};
use crate::managers::SessionManager;
use crate::pose::PoseFrame;
use crate::telemetry::TelemetrySnapshot;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub manager: Arc<SessionManager>,
}

impl HttpState {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    BadRequest(ErrorReport),
    Unprocessable(ErrorReport),
    Internal(ErrorReport),
}

impl From<FrameError> for HttpServerError {
    fn from(err: FrameError) -> Self {
        let report = ErrorReport::from(&err);
        match err {
            FrameError::Session(SessionError::InvalidSessionId) => Self::BadRequest(report),
            FrameError::Session(_) => Self::Internal(report),
            FrameError::Pose(_) => Self::Unprocessable(report),
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, report) = match self {
            Self::BadRequest(report) => (StatusCode::BAD_REQUEST, report),
            Self::Unprocessable(report) => (StatusCode::UNPROCESSABLE_ENTITY, report),
            Self::Internal(report) => (StatusCode::INTERNAL_SERVER_ERROR, report),
        };

        (status, Json(report)).into_response()
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions_tracked: usize,
}

/// Frame endpoint payload: a report, or the reason no pose was usable.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FrameResponse {
    Report(FrameReport),
    Rejected(ErrorReport),
}

/// Build the Axum router with all handlers.
pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/sessions/:session_id/frames", post(submit_frame))
        .route("/sessions/:session_id/reset", post(reset_session))
        .with_state(state)
}

/// Run the HTTP server loop until Ctrl-C.
pub async fn run_http_server(state: HttpState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding HTTP listener")?;
    info!(%addr, "HTTP server listening");
    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP router")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

pub async fn health(State(state): State<HttpState>) -> Result<Json<HealthResponse>, HttpServerError> {
    let sessions_tracked = state
        .manager
        .sessions_tracked()
        .map_err(|err| HttpServerError::from(FrameError::from(err)))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        sessions_tracked,
    }))
}

pub async fn metrics(State(state): State<HttpState>) -> Json<TelemetrySnapshot> {
    Json(state.manager.telemetry().snapshot())
}

pub async fn submit_frame(
    State(state): State<HttpState>,
    Path(session_id): Path<String>,
    Json(frame): Json<PoseFrame>,
) -> Result<Json<FrameResponse>, HttpServerError> {
    match state.manager.process_frame(&session_id, &frame) {
        Ok(report) => Ok(Json(FrameResponse::Report(report))),
        // The client repositions and resubmits; not an HTTP failure
        Err(err) if err.category() == ErrorCategory::Input => {
            Ok(Json(FrameResponse::Rejected(ErrorReport::from(&err))))
        }
        Err(err) => {
            warn!(session_id = %session_id, code = err.code(), "frame failed: {}", err);
            Err(err.into())
        }
    }
}

pub async fn reset_session(
    State(state): State<HttpState>,
    Path(session_id): Path<String>,
) -> Result<Json<ResetReport>, HttpServerError> {
    let report = state.manager.reset(&session_id)?;
    Ok(Json(report))
}
