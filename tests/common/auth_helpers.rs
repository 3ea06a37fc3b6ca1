//! Authentication test helpers
//!
//! Provides utilities for generating bearer tokens for test users.

use std::time::Duration;

use axum::http::HeaderValue;
use townsquare::backend::auth::{JwtKeys, ADMIN_ROLE};

pub const TEST_JWT_SECRET: &str = "townsquare-test-secret";

const TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Generate a token for a regular member
pub fn user_token(user_id: &str) -> String {
    JwtKeys::from_secret(TEST_JWT_SECRET)
        .create_token(
            user_id,
            Some(format!("{}@example.com", user_id)),
            vec!["member".to_string()],
            TOKEN_TTL,
        )
        .expect("Failed to generate test token")
}

/// Generate a token carrying the admin role
pub fn admin_token(user_id: &str) -> String {
    JwtKeys::from_secret(TEST_JWT_SECRET)
        .create_token(user_id, None, vec![ADMIN_ROLE.to_string()], TOKEN_TTL)
        .expect("Failed to generate test token")
}

/// Create authorization header value
pub fn auth_header(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value")
}
