//! Shared Error Types
//!
//! This module defines error types for the wire-level records that are shared
//! between the server and its clients (moderation config, queue items, results).
//!
//! # Error Categories
//!
//! - `ValidationError` - A field holds a value outside its allowed range
//!
//! # Usage
//!
//! ```rust
//! use townsquare::shared::error::SharedError;
//!
//! let error = SharedError::validation("thresholds.hate", "severity must be between 0 and 6");
//! assert!(error.to_string().contains("thresholds.hate"));
//! ```
use thiserror::Error;

/// Shared error types raised while building or validating wire records
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}
