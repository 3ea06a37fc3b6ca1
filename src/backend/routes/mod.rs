//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Architecture
//!
//! - **`router`** - Main router creation, health check, fallback, tracing
//! - **`api_routes`** - Moderation API endpoints behind the auth middleware
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! └── api_routes.rs   - API endpoint configuration
//! ```
//!
//! # Route Types
//!
//! ## Public
//!
//! - `GET /health` - Liveness check
//!
//! ## Authenticated
//!
//! - `POST /api/moderation/check` - Moderate content
//!
//! ## Admin
//!
//! - `/api/admin/moderation/config`, `/queue`, `/users/{user_id}`
//!
//! # Example
//!
//! ```rust,ignore
//! use townsquare::backend::routes::create_router;
//!
//! let router = create_router(app_state);
//! ```

/// Main router creation
pub mod router;

/// API endpoint configuration
pub mod api_routes;

// Re-export commonly used functions
pub use router::create_router;
