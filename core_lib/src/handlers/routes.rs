//! Route table for the health endpoints

use super::health::{handle_health, handle_liveness};
use crate::AppState;
use axum::{routing::get, Router};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handle_health))
        .route("/live", get(handle_liveness))
}
