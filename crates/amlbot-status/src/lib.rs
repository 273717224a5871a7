//! Read-only status endpoint powered by axum.
//!
//! Serves:
//! - `GET /status`: request counters and connectivity flags
//!
//! Any other method on `/status` is answered with `405 Method Not Allowed`.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use amlbot_core::{errors::Error, metrics::Metrics, Result};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub bot: ComponentStatus,
    pub aml: ComponentStatus,
}

#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub requests_count: u64,
    pub is_connected: bool,
}

/// Build the axum router for the status endpoint.
///
/// axum answers `HEAD` with the `GET` handler unless a `HEAD` route exists, so one is
/// registered explicitly to keep `/status` GET-only.
pub fn build_router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/status", get(status).head(method_not_allowed))
        .with_state(metrics)
}

/// Serve until `shutdown` is cancelled, then give in-flight connections `grace` to finish
/// before aborting them.
pub async fn serve(
    listener: TcpListener,
    metrics: Arc<Metrics>,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<()> {
    serve_router(listener, build_router(metrics), shutdown, grace).await
}

async fn serve_router(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Status endpoint listening on http://{addr}/status");
    }

    let server =
        axum::serve(listener, app).with_graceful_shutdown(shutdown.clone().cancelled_owned());
    let mut task = tokio::spawn(async move { server.await });

    tokio::select! {
        res = &mut task => return join_result(res),
        _ = shutdown.cancelled() => {}
    }

    match tokio::time::timeout(grace, &mut task).await {
        Ok(res) => join_result(res),
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "Status endpoint did not drain in time; aborting open connections"
            );
            task.abort();
            Ok(())
        }
    }
}

fn join_result(
    res: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match res {
        Ok(inner) => inner.map_err(Error::Io),
        Err(e) => Err(Error::Io(std::io::Error::other(format!(
            "status server task failed: {e}"
        )))),
    }
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET")])
}

/// GET /status
async fn status(State(metrics): State<Arc<Metrics>>) -> Json<StatusResponse> {
    let s = metrics.snapshot();
    Json(StatusResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        bot: ComponentStatus {
            requests_count: s.bot_requests,
            is_connected: s.bot_connected,
        },
        aml: ComponentStatus {
            requests_count: s.aml_requests,
            is_connected: s.aml_connected,
        },
    })
}
