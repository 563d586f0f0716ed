//! HTTP frame service surfaced in `http` feature builds.
//!
//! This module runs a lightweight Axum server that exposes health, metrics,
//! per-session frame submission and reset endpoints over a shared
//! [`SessionManager`](crate::managers::SessionManager).

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use crate::managers::SessionManager;

pub use routes::{build_router, run_http_server, FrameResponse, HealthResponse, HttpServerError, HttpState};

/// Build a multi-threaded runtime and serve until Ctrl-C.
pub fn serve_blocking(manager: Arc<SessionManager>, addr: SocketAddr) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building tokio runtime for HTTP server")?;

    log::info!("HTTP server binding {}", addr);
    runtime.block_on(run_http_server(HttpState::new(manager), addr))
}
