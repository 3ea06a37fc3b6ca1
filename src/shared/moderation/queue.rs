//! Moderation Queue and User Block Records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::Workflow;
use super::result::{CategoryScores, ContentType, Tier, TierStep};

/// Review status of a queue item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Approved,
    Rejected,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Approved => "approved",
            QueueStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected items never change again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QueueStatus::Pending)
    }
}

impl Default for QueueStatus {
    fn default() -> Self {
        QueueStatus::Pending
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content held for human review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModerationQueueItem {
    pub id: Uuid,
    #[serde(default)]
    pub content_type: ContentType,
    pub content_id: Option<String>,
    pub channel_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub has_image: bool,
    pub user_id: String,
    pub user_email: Option<String>,
    #[serde(default)]
    pub workflow: Workflow,
    pub tier_flow: Vec<TierStep>,
    pub triggering_tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_scores: Option<CategoryScores>,
    pub status: QueueStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ModerationQueueItem {
    pub fn is_pending(&self) -> bool {
        self.status == QueueStatus::Pending
    }
}

/// Query string of `GET /api/admin/moderation/queue`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListQueueQuery {
    #[serde(default)]
    pub status: Option<QueueStatus>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQueueResponse {
    pub items: Vec<ModerationQueueItem>,
    pub count: usize,
}

/// Body of `POST /api/admin/moderation/queue/{id}/resolve`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQueueItemRequest {
    pub status: QueueStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Whether a user may currently post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserModerationState {
    pub user_id: String,
    pub blocked: bool,
    pub reason: Option<String>,
    pub blocked_by: Option<String>,
    pub blocked_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl UserModerationState {
    /// State of a user with no moderation history
    pub fn unblocked(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            blocked: false,
            reason: None,
            blocked_by: None,
            blocked_at: None,
            updated_at: None,
            updated_by: None,
        }
    }
}

/// Body of `PUT /api/admin/moderation/users/{userId}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetUserBlockRequest {
    pub blocked: bool,
    #[serde(default)]
    pub reason: Option<String>,
}
