//! Shared Module
//!
//! Types and data structures shared between the moderation server and the
//! platform services that call it. All types are plain serde records so they
//! can be used without the server-side (`ssr`) dependency stack.

/// Shared error types
pub mod error;

/// External service configuration
pub mod config;

/// Moderation wire types (config, verdicts, queue, user state)
pub mod moderation;

/// Re-export commonly used types for convenience
pub use config::{ConfigError, ServiceConfig, ServiceConfigBuilder};
pub use error::SharedError;
