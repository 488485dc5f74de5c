/// Unified error types for the blogmesh services
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type shared by every service
#[derive(Error, Debug)]
pub enum MeshError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Unknown identifier in the owning store
    #[error("{0}")]
    NotFound(String),

    /// Referenced parent entity is absent from its peer store
    #[error("{0}")]
    DependencyNotFound(String),

    /// Duplicate unique field (e.g., email)
    #[error("{0}")]
    Conflict(String),

    /// Notification delivery failed. Logged by the dispatcher, never returned to a client.
    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    /// Gateway could not reach an upstream service
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    /// Machine-readable error code used in response bodies
    pub fn code(&self) -> &'static str {
        match self {
            MeshError::Validation(_) => "ValidationError",
            MeshError::NotFound(_) => "NotFound",
            MeshError::DependencyNotFound(_) => "DependencyNotFound",
            MeshError::Conflict(_) => "Conflict",
            MeshError::Upstream(_) => "UpstreamUnavailable",
            MeshError::Dispatch(_)
            | MeshError::Config(_)
            | MeshError::Internal(_)
            | MeshError::Io(_) => "InternalServerError",
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            MeshError::Validation(_) => StatusCode::BAD_REQUEST,
            MeshError::NotFound(_) | MeshError::DependencyNotFound(_) => StatusCode::NOT_FOUND,
            MeshError::Conflict(_) => StatusCode::CONFLICT,
            MeshError::Upstream(_) => StatusCode::BAD_GATEWAY,
            MeshError::Dispatch(_)
            | MeshError::Config(_)
            | MeshError::Internal(_)
            | MeshError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert MeshError to HTTP response
impl IntoResponse for MeshError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            MeshError::Upstream(_) => "Upstream service unavailable".to_string(),
            MeshError::Dispatch(_)
            | MeshError::Config(_)
            | MeshError::Internal(_)
            | MeshError::Io(_) => "Internal server error".to_string(), // Don't leak details
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for MeshError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    (field.to_string(), message)
                })
            })
            .collect();
        messages.sort();
        messages.dedup_by(|a, b| a.1 == b.1);

        let text = messages
            .into_iter()
            .map(|(_, message)| message)
            .collect::<Vec<_>>()
            .join(", ");

        MeshError::Validation(text)
    }
}

/// Result type alias for service operations
pub type MeshResult<T> = Result<T, MeshError>;
