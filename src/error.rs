//! # Error Handling
//!
//! This module defines the user-facing error taxonomy of the interview service and how
//! each kind is converted into an HTTP response.
//!
//! ## Error Categories:
//! - **NotFound**: the session id is unknown (404)
//! - **CapacityExceeded**: too many PENDING/ACTIVE sessions (429)
//! - **InvalidState**: the session is in the wrong status for the operation (409)
//! - **BadRequest / ValidationError / DocumentError**: the client sent something unusable (400)
//! - **PayloadTooLarge**: an upload exceeded the configured limit (413)
//! - **ConfigError / Internal**: server-side problems (500)
//!
//! Remote collaborator failures are deliberately absent from this list. They are
//! absorbed inside the pipeline (see `pipeline::Pipeline`) and never reach a caller.

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Custom error types for the application.
///
/// ## Usage Example:
/// ```rust
/// return Err(AppError::NotFound(format!("Session {} not found", session_id)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Internal server errors
    Internal(String),

    /// Client sent invalid or malformed data
    BadRequest(String),

    /// Requested session was not found
    NotFound(String),

    /// Session creation refused because the concurrent session ceiling is reached
    CapacityExceeded(usize),

    /// Operation attempted against a session in the wrong status
    InvalidState(String),

    /// Configuration file or environment variable problems
    ConfigError(String),

    /// User input failed validation rules
    ValidationError(String),

    /// Uploaded payload is larger than allowed
    PayloadTooLarge(String),

    /// Uploaded document could not be turned into text
    DocumentError(String),
}

impl AppError {
    /// Machine-readable error type used in the JSON envelope.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::CapacityExceeded(_) => "capacity_exceeded",
            AppError::InvalidState(_) => "invalid_state",
            AppError::ConfigError(_) => "config_error",
            AppError::ValidationError(_) => "validation_error",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::DocumentError(_) => "document_error",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::CapacityExceeded(max) => {
                write!(f, "Maximum concurrent sessions ({}) reached", max)
            }
            AppError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::DocumentError(msg) => write!(f, "Document error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts errors into HTTP responses.
///
/// ## JSON Response Format:
/// ```json
/// {
///   "error": {
///     "type": "invalid_state",
///     "message": "Invalid state: Session already completed",
///     "timestamp": "2025-01-01T12:00:00Z"
///   }
/// }
/// ```
impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AppError::Internal(_) | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) | AppError::ValidationError(_) | AppError::DocumentError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CapacityExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": {
                "type": self.error_type(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

/// Errors bubbling up through `anyhow` become internal errors.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// JSON parsing errors are almost always the client's fault, so they map to 400.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

/// Shorthand for `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;
