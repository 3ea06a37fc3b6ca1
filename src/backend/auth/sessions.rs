/**
 * Session Tokens
 *
 * Verification of the HS256 bearer tokens the identity provider issues.
 * Claims carry the user id (`sub`), an optional email and the user's roles;
 * the `admin` role unlocks the admin moderation endpoints.
 *
 * Token issuance lives with the identity provider. `create_token` exists for
 * local development and tests.
 */

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, encode, get_current_timestamp, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Role granting access to the admin moderation endpoints
pub const ADMIN_ROLE: &str = "admin";

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role names
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|candidate| candidate == role)
    }
}

/// Signing and verification keys derived from the shared secret
#[derive(Clone)]
pub struct JwtKeys {
    inner: Arc<KeyPair>,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            inner: Arc::new(KeyPair {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
        }
    }

    /// Create a signed token valid for `ttl`
    pub fn create_token(
        &self,
        user_id: &str,
        email: Option<String>,
        roles: Vec<String>,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = get_current_timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email,
            roles,
            exp: now + ttl.as_secs(),
            iat: now,
        };
        encode(&Header::default(), &claims, &self.inner.encoding)
    }

    /// Verify signature and expiry and return the claims
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(token, &self.inner.decoding, &validation)?;
        Ok(token_data.claims)
    }
}
