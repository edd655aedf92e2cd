//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! rendered as an HTTP response.

use crate::config::ConfigError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mentorship_core::ports::PortError;
use serde_json::json;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the core services or ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The seed users file could not be read into users and tokens.
    #[error("Seed users error: {0}")]
    Seed(String),

    /// The request body or path could not be read into the expected shape.
    #[error("{0}")]
    Rejected(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Port(PortError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Port(PortError::Conflict(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Port(PortError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Port(PortError::Unauthorized(msg)) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Rejected(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        // Storage and infrastructure details stay in the logs.
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "message": message }))).into_response()
    }
}
