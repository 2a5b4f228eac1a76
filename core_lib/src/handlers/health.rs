//! Health report handlers

use crate::{health::Status, AppState};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info, warn};

/// Runs every configured checker and answers with the assembled report.
/// 200 for pass/warn, 503 for fail, 500 with the raw error text if the
/// report cannot be serialized.
pub async fn handle_health(State(state): State<AppState>) -> Response {
    info!("GET /health - Running health checks");

    let health = state.reporter.report().await;
    let status = health.status();

    let body = match health.to_json() {
        Ok(body) => body,
        Err(err) => {
            warn!(status = %status, "Unable to marshal checks");
            return err.into_response();
        }
    };

    match status {
        Status::Pass => {}
        Status::Warn => warn!("System health is degraded"),
        Status::Fail => warn!("System health is failing"),
    }
    debug!(status = %status, keys = health.checks().len(), "Health report assembled");

    (
        status.status_code(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

pub async fn handle_liveness() -> impl IntoResponse {
    info!("GET /live - Liveness probe");

    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": Status::Pass })),
    )
}

