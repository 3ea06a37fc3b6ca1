//! Backend Error Module
//!
//! This module defines the error type returned by HTTP handlers and its
//! conversion into an HTTP response.
//!
//! # Architecture
//!
//! - **`types`** - `BackendError` and its status/message mapping
//! - **`conversion`** - `IntoResponse` implementation (JSON error body)
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Error conversion implementations
//! ```
//!
//! Lower layers have their own errors (`SharedError`, `StoreError`,
//! `ModerationError`); handlers convert them with `?` and the mapping in
//! `types` picks the status code.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
