//! Backend Module
//!
//! This module contains all server-side code for the townsquare moderation
//! service: the Axum HTTP server, the tiered moderation pipeline, the
//! document store it persists to, and bearer token authentication.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`moderation`** - Tier 1-3 pipeline, review queue, config, user blocks
//! - **`store`** - Document store trait with PostgreSQL and in-memory adapters
//! - **`auth`** - JWT verification
//! - **`middleware`** - Request authentication
//! - **`error`** - Backend error type and its HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── moderation/     - Moderation pipeline and handlers
//! ├── store/          - Document persistence
//! ├── auth/           - Token verification
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Error Handling
//!
//! Each layer has its own `thiserror` enum; handlers return `BackendError`,
//! which converts the lower errors with `?` and renders a JSON body with the
//! matching status code.
//!
//! # Example
//!
//! ```rust,no_run
//! use townsquare::backend::server::ServerConfig;
//!
//! # async fn example() {
//! let config = ServerConfig::from_env().expect("invalid configuration");
//! let app = townsquare::backend::create_app(&config).await;
//! # }
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Content moderation pipeline
pub mod moderation;

/// Document persistence
pub mod store;

/// Backend error types
pub mod error;

/// Token verification
pub mod auth;

/// Middleware for request processing
pub mod middleware;

/// Re-export commonly used types
pub use error::BackendError;
pub use server::create_app;
