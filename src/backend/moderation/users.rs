/**
 * User Block State
 *
 * Per-user block flag set by admins. A user without a stored record is
 * unblocked.
 */

use std::sync::Arc;

use chrono::Utc;

use super::error::ModerationError;
use crate::backend::store::{collections, DocumentStore, StoreError};
use crate::shared::moderation::UserModerationState;
use crate::shared::SharedError;

pub struct UserModerationStore {
    store: Arc<dyn DocumentStore>,
}

impl UserModerationStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_block_status(
        &self,
        user_id: &str,
    ) -> Result<UserModerationState, ModerationError> {
        let user_id = validate_user_id(user_id)?;
        match self.store.get(collections::USER_MODERATION, user_id).await? {
            Some(document) => Ok(document.decode()?),
            None => Ok(UserModerationState::unblocked(user_id)),
        }
    }

    pub async fn is_blocked(&self, user_id: &str) -> Result<bool, ModerationError> {
        Ok(self.get_block_status(user_id).await?.blocked)
    }

    /// Block or unblock `user_id`, recording who did it
    pub async fn set_block_status(
        &self,
        user_id: &str,
        blocked: bool,
        reason: Option<String>,
        actor: &str,
    ) -> Result<UserModerationState, ModerationError> {
        let user_id = validate_user_id(user_id)?;
        let now = Utc::now();
        let existing = self.store.get(collections::USER_MODERATION, user_id).await?;

        let state = UserModerationState {
            user_id: user_id.to_string(),
            blocked,
            reason,
            blocked_by: blocked.then(|| actor.to_string()),
            blocked_at: blocked.then_some(now),
            updated_at: Some(now),
            updated_by: Some(actor.to_string()),
        };
        let body = serde_json::to_value(&state).map_err(StoreError::from)?;

        match existing {
            Some(_) => {
                self.store
                    .replace(collections::USER_MODERATION, user_id, body, None)
                    .await?;
            }
            None => match self
                .store
                .create(collections::USER_MODERATION, user_id, body.clone())
                .await
            {
                Ok(_) => {}
                Err(StoreError::AlreadyExists { .. }) => {
                    self.store
                        .replace(collections::USER_MODERATION, user_id, body, None)
                        .await?;
                }
                Err(e) => return Err(e.into()),
            },
        }

        tracing::info!(user_id, blocked, actor, "User block status changed");
        Ok(state)
    }
}

fn validate_user_id(user_id: &str) -> Result<&str, SharedError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(SharedError::validation("userId", "user id must not be empty"));
    }
    Ok(trimmed)
}
