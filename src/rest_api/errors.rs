//! # REST API Errors
//!
//! Error types for the REST API module. Every engine error is converted
//! here, at the request boundary; none of them ends the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::engine::EngineError;
use crate::schema::{ValidationResult, Violation};

use super::access::AccessError;

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// REST API errors
#[derive(Debug, Error)]
pub enum RestError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Request body is not JSON
    #[error("Invalid request body")]
    InvalidBody(String),

    /// Create against a type that is not registered
    #[error("Invalid entity type specified")]
    InvalidType(String),

    /// Any other route naming an unregistered type
    #[error("Entity type not valid")]
    UnknownType(String),

    #[error("Entity ID format invalid")]
    MalformedId(String),

    #[error("Entity ID not valid")]
    NotFound(String),

    #[error("Schema not found")]
    SchemaNotFound(String),

    #[error("Not found")]
    RouteNotFound(String),

    #[error("Validation failed")]
    Validation(ValidationResult),

    // ==================
    // Access Errors
    // ==================
    #[error("{0}")]
    Access(#[from] AccessError),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Stored record references a type that is no longer registered
    #[error("Unable to return entity - entity is of unknown type")]
    Integrity(String),

    #[error("Internal error")]
    Internal(String),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            RestError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidType(_) => StatusCode::BAD_REQUEST,
            RestError::MalformedId(_) => StatusCode::BAD_REQUEST,
            RestError::Validation(_) => StatusCode::BAD_REQUEST,

            // 403 Forbidden
            RestError::Access(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            RestError::UnknownType(_) => StatusCode::NOT_FOUND,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::SchemaNotFound(_) => StatusCode::NOT_FOUND,
            RestError::RouteNotFound(_) => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            RestError::Integrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Detail shown next to the error headline
    fn message(&self) -> Option<String> {
        match self {
            RestError::InvalidBody(detail) | RestError::Internal(detail) => Some(detail.clone()),
            RestError::InvalidType(name)
            | RestError::UnknownType(name)
            | RestError::SchemaNotFound(name) => Some(name.clone()),
            RestError::MalformedId(id) | RestError::NotFound(id) | RestError::Integrity(id) => {
                Some(id.clone())
            }
            RestError::RouteNotFound(path) => Some(path.clone()),
            RestError::Validation(_) | RestError::Access(_) => None,
        }
    }
}

impl From<EngineError> for RestError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnknownType(name) => RestError::UnknownType(name),
            EngineError::Validation(result) => RestError::Validation(result),
            EngineError::MalformedIdentifier(id) => RestError::MalformedId(id),
            EngineError::NotFound { id } => RestError::NotFound(id),
            EngineError::Integrity { id, .. } => RestError::Integrity(id),
            EngineError::Storage(e) => RestError::Internal(e.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

impl From<RestError> for ErrorResponse {
    fn from(err: RestError) -> Self {
        let error = err.to_string();
        let message = err.message();
        let violations = match err {
            RestError::Validation(result) => Some(result.into_violations()),
            _ => None,
        };
        Self {
            error,
            message,
            violations,
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(event = "REQUEST_FAILED", status = status.as_u16(), error = ?self);
        }
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
