//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Fake external services (link reputation, AI classifier)
//! - A moderation service wired on the in-memory store
//! - Authentication test helpers

pub mod auth_helpers;
pub mod fakes;

// Re-export commonly used utilities
pub use auth_helpers::*;
pub use fakes::*;
pub use fixtures::*;
