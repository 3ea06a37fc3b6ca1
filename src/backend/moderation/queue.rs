/**
 * Moderation Review Queue
 *
 * Persisted items for content that tier 3 held back for a human moderator.
 * Items start `pending` and are resolved exactly once to `approved` or
 * `rejected`; they are never deleted.
 *
 * # Concurrent Resolution
 *
 * Resolution reads the item, checks it is still pending and writes it back
 * with the version it read. If two moderators resolve the same item at once
 * only one write succeeds; the other gets `AlreadyResolved` and the stored
 * item keeps the first moderator's decision.
 */

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::error::ModerationError;
use crate::backend::store::{collections, DocumentStore, QueryFilter, StoreError};
use crate::shared::moderation::{
    CategoryScores, ContentType, ListQueueQuery, ModerationQueueItem, QueueStatus,
    ResolveQueueItemRequest, Tier, TierStep, Workflow,
};
use crate::shared::SharedError;

pub const DEFAULT_QUEUE_LIMIT: usize = 50;
pub const MAX_QUEUE_LIMIT: usize = 200;

/// Everything needed to open a review item
#[derive(Debug, Clone)]
pub struct NewQueueItem {
    pub content_type: ContentType,
    pub content_id: Option<String>,
    pub channel_id: Option<String>,
    pub text: String,
    pub has_image: bool,
    pub user_id: String,
    pub user_email: Option<String>,
    pub workflow: Workflow,
    pub tier_flow: Vec<TierStep>,
    pub triggering_tier: Tier,
    pub category_scores: Option<CategoryScores>,
}

pub struct ModerationQueue {
    store: Arc<dyn DocumentStore>,
}

impl ModerationQueue {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist a new pending item
    pub async fn enqueue(&self, item: NewQueueItem) -> Result<ModerationQueueItem, ModerationError> {
        let item = ModerationQueueItem {
            id: Uuid::new_v4(),
            content_type: item.content_type,
            content_id: item.content_id,
            channel_id: item.channel_id,
            text: item.text,
            has_image: item.has_image,
            user_id: item.user_id,
            user_email: item.user_email,
            workflow: item.workflow,
            tier_flow: item.tier_flow,
            triggering_tier: item.triggering_tier,
            category_scores: item.category_scores,
            status: QueueStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            notes: None,
            created_at: Utc::now(),
        };

        let body = serde_json::to_value(&item).map_err(StoreError::from)?;
        self.store
            .create(collections::MODERATION_QUEUE, &item.id.to_string(), body)
            .await?;

        tracing::info!(
            item_id = %item.id,
            user_id = %item.user_id,
            workflow = %item.workflow,
            "Content queued for review"
        );
        Ok(item)
    }

    /// Items newest first, optionally filtered by status
    pub async fn list(
        &self,
        query: ListQueueQuery,
    ) -> Result<Vec<ModerationQueueItem>, ModerationError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_QUEUE_LIMIT)
            .clamp(1, MAX_QUEUE_LIMIT);

        let mut filter = QueryFilter::new().newest_first().limit(limit);
        if let Some(status) = query.status {
            filter = filter.field_equals("status", status.as_str());
        }

        let documents = self
            .store
            .query(collections::MODERATION_QUEUE, &filter)
            .await?;

        Ok(documents
            .into_iter()
            .filter_map(|document| match document.decode::<ModerationQueueItem>() {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(id = %document.id, error = %e, "Skipping malformed queue item");
                    None
                }
            })
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<ModerationQueueItem, ModerationError> {
        let document = self
            .store
            .get(collections::MODERATION_QUEUE, &id.to_string())
            .await?
            .ok_or_else(|| ModerationError::not_found("queue item", id))?;
        Ok(document.decode()?)
    }

    /// Move a pending item to `approved` or `rejected`
    pub async fn resolve(
        &self,
        id: Uuid,
        request: &ResolveQueueItemRequest,
        reviewer: &str,
    ) -> Result<ModerationQueueItem, ModerationError> {
        if !request.status.is_terminal() {
            return Err(SharedError::validation(
                "status",
                "a queue item can only be resolved to approved or rejected",
            )
            .into());
        }

        let key = id.to_string();
        let document = self
            .store
            .get(collections::MODERATION_QUEUE, &key)
            .await?
            .ok_or_else(|| ModerationError::not_found("queue item", id))?;

        let mut item: ModerationQueueItem = document.decode()?;
        if !item.is_pending() {
            return Err(ModerationError::AlreadyResolved { id });
        }

        item.status = request.status;
        item.reviewed_by = Some(reviewer.to_string());
        item.reviewed_at = Some(Utc::now());
        item.notes = request.notes.clone();

        let body = serde_json::to_value(&item).map_err(StoreError::from)?;
        match self
            .store
            .replace(collections::MODERATION_QUEUE, &key, body, Some(document.version))
            .await
        {
            Ok(_) => {}
            Err(StoreError::Conflict { .. }) => return Err(ModerationError::AlreadyResolved { id }),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(item_id = %id, status = %item.status, reviewer, "Queue item resolved");
        Ok(item)
    }
}
