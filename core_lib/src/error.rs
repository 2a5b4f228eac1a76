//! Error types for the health report engine and its HTTP surface

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HealthError>;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("unrecognized status: {0:?}")]
    UnrecognizedStatus(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for HealthError {
    fn into_response(self) -> Response {
        let status = match &self {
            HealthError::MalformedKey(_) | HealthError::UnrecognizedStatus(_) => {
                StatusCode::BAD_REQUEST
            }
            HealthError::Serialization(err) => {
                tracing::error!("Unable to serialize health report: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            other => {
                tracing::error!("Unexpected error: {:?}", other);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // The raw error text is the body, so a consumer can see why the report is missing.
        let body = match self {
            HealthError::Serialization(err) => err.to_string(),
            other => other.to_string(),
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
