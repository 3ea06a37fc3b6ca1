//! Authentication Module
//!
//! Bearer token verification. Users sign in with the platform's identity
//! provider; this service only checks the tokens it issues and reads the
//! user id, email and roles from their claims.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! └── sessions.rs     - JWT claims, keys, verification
//! ```
//!
//! The middleware that applies this to requests lives in
//! `backend::middleware::auth`.

/// JWT token generation and validation
pub mod sessions;

pub use sessions::{Claims, JwtKeys, ADMIN_ROLE};
