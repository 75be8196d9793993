//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service, and how domain errors
//! are turned into HTTP responses.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use letter_core::{LetterError, PortError, TraversalError};
use serde_json::json;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the letter engine or its repositories.
    #[error("Letter Error: {0}")]
    Letter(#[from] LetterError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying the database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Letter(e) => letter_error_response(e),
            ApiError::Port(e) => letter_error_response(LetterError::Port(e)),
            other => {
                error!("Request failed: {:?}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Maps a domain error to its status code and a JSON body the editor can show.
fn letter_error_response(err: LetterError) -> Response {
    let status = match &err {
        LetterError::MalformedDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LetterError::InvalidJson(_) => StatusCode::BAD_REQUEST,
        LetterError::AccessDenied(_) => StatusCode::FORBIDDEN,
        LetterError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
        LetterError::Port(PortError::Unauthorized) => StatusCode::UNAUTHORIZED,
        LetterError::Traversal(TraversalError::SectionNotFound(_)) => StatusCode::NOT_FOUND,
        LetterError::Traversal(_) => StatusCode::BAD_REQUEST,
        LetterError::Port(PortError::Unexpected(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {:?}", err);
        return (status, "Internal server error").into_response();
    }

    let body = match &err {
        LetterError::MalformedDocument(violations) => json!({
            "error": err.to_string(),
            "violations": violations,
        }),
        _ => json!({ "error": err.to_string() }),
    };
    (status, Json(body)).into_response()
}
