//! Request tracing for the health endpoints

use axum::{body::Body, Router};
use http::{Request, Response, StatusCode};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info_span;

pub fn with_request_logging<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            info_span!(
                "health_request",
                method = %request.method(),
                path = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &tracing::Span| {
            tracing::debug!(
                "started processing request {} {}",
                request.method(),
                request.uri().path()
            );
        })
        .on_response(|response: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            let status = response.status();
            let latency_ms = latency.as_millis();

            // 503 is an ordinary answer here: the service reports itself failing.
            if status.is_success() || status == StatusCode::SERVICE_UNAVAILABLE {
                tracing::info!(
                    status = status.as_u16(),
                    latency_ms = latency_ms,
                    "health request completed"
                );
            } else if status.is_client_error() {
                tracing::warn!(
                    status = status.as_u16(),
                    latency_ms = latency_ms,
                    "client error response"
                );
            } else {
                tracing::error!(
                    status = status.as_u16(),
                    latency_ms = latency_ms,
                    "server error response"
                );
            }
        })
        .on_failure(());

    router.layer(layer)
}
