//! Townsquare - Content Moderation Backend
//!
//! Townsquare is the moderation core of a community platform. Every piece of
//! user-submitted content (chat messages, group posts, event descriptions,
//! comments) passes through a tiered pipeline that decides whether it is
//! allowed, held for human review, or rejected.
//!
//! # Overview
//!
//! - **Tier 1** - local keyword blocklist, case-insensitive
//! - **Tier 2** - link-safety lookup against a URL reputation service, with a
//!   TTL-bounded local verdict cache
//! - **Tier 3** - AI content classification (hate, sexual, violence,
//!   self-harm) compared against admin-tunable thresholds
//! - **Queue** - persisted review items for content that tier 3 holds back
//!
//! Tiers 2 and 3 depend on external services and fail open: when the service
//! is unavailable the content is allowed and the failure is recorded in the
//! result's tier flow.
//!
//! # Module Structure
//!
//! - **`shared`** - wire types shared with the platform services that call
//!   the moderation API (config, verdicts, queue items, user block state)
//!
//! - **`backend`** - server-side code (only compiled with the `ssr` feature)
//!   - Tier implementations and the orchestrator
//!   - Config store, review queue and user block state
//!   - Document store adapters (PostgreSQL via sqlx, in-memory)
//!   - Axum routes, JWT authentication, error conversion
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the backend module and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use townsquare::backend::server::{config::ServerConfig, init::create_app};
//!
//! # async fn example() {
//! let config = ServerConfig::from_env().expect("invalid configuration");
//! let app = create_app(&config).await;
//! // Serve `app` with axum
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
