/**
 * Moderation Error Types
 *
 * Two layers of errors live here:
 *
 * - `ServiceError` - failures talking to an external moderation service
 *   (link reputation, AI classifier). These never leave tiers 2 and 3: the
 *   fallback policy turns them into fail-open verdicts.
 * - `ModerationError` - failures of the moderation core itself (bad input,
 *   missing queue items, concurrent resolution, persistence), which are
 *   surfaced to callers and mapped to HTTP statuses by `BackendError`.
 */

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::backend::store::StoreError;
use crate::shared::SharedError;

/// Failure of one call to an external moderation service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited by upstream service")]
    RateLimited,

    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Whether repeating the call could plausibly succeed.
    ///
    /// Rate limiting and 4xx responses are not retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Timeout(_) | ServiceError::Transport(_) => true,
            ServiceError::Http { status } => *status >= 500,
            ServiceError::RateLimited | ServiceError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::Http {
                status: status.as_u16(),
            }
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Failure of a moderation core operation
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error(transparent)]
    Validation(#[from] SharedError),

    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: String },

    #[error("queue item {id} has already been resolved")]
    AlreadyResolved { id: Uuid },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ModerationError {
    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }
}
