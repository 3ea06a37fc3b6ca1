//! Middleware Module
//!
//! HTTP middleware for the backend server. Middleware runs before the
//! handlers: bearer token authentication, plus the body, path and query
//! extractors that report malformed input as [`BackendError`].
//!
//! [`BackendError`]: crate::backend::error::BackendError
//!
//! # Architecture
//!
//! - **`auth`** - Authentication middleware plus the `AuthUser` and
//!   `AdminUser` extractors
//! - **`extract`** - `ApiJson`, `ApiPath` and `ApiQuery`
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//! use townsquare::backend::middleware::auth_middleware;
//!
//! let protected = routes.route_layer(from_fn_with_state(state.clone(), auth_middleware));
//! ```

pub mod auth;
pub mod extract;

pub use auth::{auth_middleware, AdminUser, AuthUser, AuthenticatedUser};
pub use extract::{ApiJson, ApiPath, ApiQuery};
