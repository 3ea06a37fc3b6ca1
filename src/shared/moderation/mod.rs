//! Moderation Types
//!
//! Wire records for the content moderation pipeline. These are what the
//! platform's chat, group and event handlers send to the moderation API and
//! what admins read and write through the admin endpoints.
//!
//! - **`config`** - thresholds, blocklist, workflow profiles, partial updates
//! - **`result`** - check requests, verdicts and per-tier detail
//! - **`queue`** - review queue items and user block state

pub mod config;
pub mod queue;
pub mod result;

pub use config::{
    Category, MatchMode, ModerationConfig, ModerationConfigPatch, Thresholds, ThresholdsPatch,
    Tier3Action, Workflow, WorkflowProfile, WorkflowProfilePatch,
};
pub use queue::{
    ListQueueQuery, ListQueueResponse, ModerationQueueItem, QueueStatus, ResolveQueueItemRequest,
    SetUserBlockRequest, UserModerationState,
};
pub use result::{
    BlocklistMatch, CategoryScores, CheckContentRequest, CheckedUrl, Classification, ContentType,
    LinkCheckReport, LinkVerdict, ModerationAction, ModerationReason, ModerationResult, Tier,
    TierStep, TierVerdict, MAX_CONTENT_LENGTH,
};
