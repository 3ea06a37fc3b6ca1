/**
 * Backend Error Types
 *
 * This module defines the error type returned by HTTP handlers. Every
 * variant maps to an HTTP status and a message that is safe to show to
 * the caller.
 *
 * # Status Mapping
 *
 * - malformed body, path or query string - 400 (415 without a JSON content type)
 * - validation failures (bad input, bad patch) - 400
 * - missing or invalid bearer token - 401
 * - authenticated but not an admin - 403
 * - unknown queue item - 404
 * - queue item already resolved - 409
 * - storage failures - 500, with a generic message
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::moderation::ModerationError;
use crate::shared::SharedError;

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error with an explicit status (e.g., malformed request)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Missing, malformed or expired credentials
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Valid credentials without the required role
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Error from the shared module, typically validation
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Error from the moderation core
    #[error(transparent)]
    ModerationError(#[from] ModerationError),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::SharedError(err) => shared_status(err),
            Self::ModerationError(err) => match err {
                ModerationError::Validation(shared) => shared_status(shared),
                ModerationError::NotFound { .. } => StatusCode::NOT_FOUND,
                ModerationError::AlreadyResolved { .. } => StatusCode::CONFLICT,
                ModerationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error message shown to the caller.
    ///
    /// Internal failures are reported generically; their detail goes to the log.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Unauthorized { message } => message.clone(),
            Self::Forbidden { message } => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::ModerationError(ModerationError::Store(_)) => "Internal server error".to_string(),
            Self::ModerationError(err) => err.to_string(),
        }
    }
}

fn shared_status(err: &SharedError) -> StatusCode {
    match err {
        SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
    }
}
