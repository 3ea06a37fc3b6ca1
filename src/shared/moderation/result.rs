//! Moderation Verdicts
//!
//! Request and result records exchanged with callers of the moderation
//! pipeline, plus the per-tier detail types that make up the diagnostic
//! tier flow.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::{Category, Thresholds, Workflow};

/// Longest text (in characters) accepted for moderation
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Kind of user-submitted content being moderated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    ChatMessage,
    GroupPost,
    Comment,
    Event,
    Announcement,
    Profile,
}

/// Body of `POST /api/moderation/check`.
///
/// The author is taken from the caller's token, never from the body.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckContentRequest {
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub text: String,
    /// Optional image attached to the content, base64 encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub workflow: Workflow,
}

/// Final decision for a piece of content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Allow,
    Pending,
    Reject,
}

/// Fixed taxonomy of reasons surfaced to end users
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModerationReason {
    None,
    Tier1KeywordMatch,
    Tier2MaliciousLink,
    Tier3AiViolation,
    EmptyContent,
    ContentTooLong,
    UserBlocked,
}

impl ModerationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationReason::None => "none",
            ModerationReason::Tier1KeywordMatch => "tier1_keyword_match",
            ModerationReason::Tier2MaliciousLink => "tier2_malicious_link",
            ModerationReason::Tier3AiViolation => "tier3_ai_violation",
            ModerationReason::EmptyContent => "empty_content",
            ModerationReason::ContentTooLong => "content_too_long",
            ModerationReason::UserBlocked => "user_blocked",
        }
    }

    /// Human-readable text shown to the author
    pub fn message(&self, action: ModerationAction) -> String {
        match (self, action) {
            (ModerationReason::None, _) => "Content allowed".to_string(),
            (ModerationReason::Tier1KeywordMatch, _) => {
                "Your message contains language that isn't allowed in this community.".to_string()
            }
            (ModerationReason::Tier2MaliciousLink, _) => {
                "Your message contains a link that was flagged as unsafe.".to_string()
            }
            (ModerationReason::Tier3AiViolation, ModerationAction::Pending) => {
                "Your message is being reviewed by a moderator before it is posted.".to_string()
            }
            (ModerationReason::Tier3AiViolation, _) => {
                "Your message was flagged as violating community guidelines.".to_string()
            }
            (ModerationReason::EmptyContent, _) => "Message is empty.".to_string(),
            (ModerationReason::ContentTooLong, _) => format!(
                "Message exceeds the maximum length of {} characters.",
                MAX_CONTENT_LENGTH
            ),
            (ModerationReason::UserBlocked, _) => {
                "Your account is currently blocked from posting.".to_string()
            }
        }
    }
}

impl fmt::Display for ModerationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Tier1 => f.write_str("tier1"),
            Tier::Tier2 => f.write_str("tier2"),
            Tier::Tier3 => f.write_str("tier3"),
        }
    }
}

/// Outcome of a single tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TierVerdict {
    /// Nothing found
    Clear,
    /// Hard block
    Block,
    /// Flagged for human review
    Review,
    /// The tier's dependency was unavailable and content was let through
    FailedOpen,
}

/// One entry in the tier flow audit trail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TierStep {
    pub tier: Tier,
    pub verdict: TierVerdict,
    pub detail: String,
}

impl TierStep {
    pub fn new(tier: Tier, verdict: TierVerdict, detail: impl Into<String>) -> Self {
        Self {
            tier,
            verdict,
            detail: detail.into(),
        }
    }
}

/// Tier 1 result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlocklistMatch {
    pub matched: bool,
    pub matches: Vec<String>,
}

/// Reputation of a single URL
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkVerdict {
    Malicious,
    Clean,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckedUrl {
    pub url: String,
    pub verdict: LinkVerdict,
    /// Verdict came from the local cache rather than a fresh lookup
    #[serde(default)]
    pub cached: bool,
}

/// Tier 2 result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LinkCheckReport {
    pub has_malicious_link: bool,
    pub checked_urls: Vec<CheckedUrl>,
}

impl LinkCheckReport {
    pub fn malicious_urls(&self) -> impl Iterator<Item = &str> {
        self.checked_urls
            .iter()
            .filter(|checked| checked.verdict == LinkVerdict::Malicious)
            .map(|checked| checked.url.as_str())
    }

    pub fn unknown_count(&self) -> usize {
        self.checked_urls
            .iter()
            .filter(|checked| checked.verdict == LinkVerdict::Unknown)
            .count()
    }
}

/// Per-category severity on the classifier's 0-6 scale
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScores {
    pub hate: u8,
    pub sexual: u8,
    pub violence: u8,
    pub self_harm: u8,
}

impl CategoryScores {
    pub fn get(&self, category: Category) -> u8 {
        match category {
            Category::Hate => self.hate,
            Category::Sexual => self.sexual,
            Category::Violence => self.violence,
            Category::SelfHarm => self.self_harm,
        }
    }

    pub fn set(&mut self, category: Category, score: u8) {
        match category {
            Category::Hate => self.hate = score,
            Category::Sexual => self.sexual = score,
            Category::Violence => self.violence = score,
            Category::SelfHarm => self.self_harm = score,
        }
    }

    /// Category-wise maximum of two score sets
    pub fn max(self, other: CategoryScores) -> CategoryScores {
        let mut merged = self;
        for category in Category::ALL {
            merged.set(category, self.get(category).max(other.get(category)));
        }
        merged
    }

    /// Categories whose score meets or exceeds its threshold
    pub fn violations(&self, thresholds: &Thresholds) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|category| self.get(*category) >= thresholds.get(*category))
            .collect()
    }
}

/// Tier 3 result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub category_scores: CategoryScores,
    pub violates_threshold: bool,
    pub violated_categories: Vec<Category>,
}

impl Classification {
    pub fn evaluate(category_scores: CategoryScores, thresholds: &Thresholds) -> Self {
        let violated_categories = category_scores.violations(thresholds);
        Self {
            category_scores,
            violates_threshold: !violated_categories.is_empty(),
            violated_categories,
        }
    }
}

/// Verdict returned to the caller of the moderation pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResult {
    pub allowed: bool,
    pub action: ModerationAction,
    pub reason: ModerationReason,
    pub message: String,
    pub tier_flow: Vec<TierStep>,
    /// Blocklist terms that matched (tier 1)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier1: Option<BlocklistMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier2: Option<LinkCheckReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier3: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_item_id: Option<Uuid>,
}

impl ModerationResult {
    pub fn decided(action: ModerationAction, reason: ModerationReason) -> Self {
        Self {
            allowed: action == ModerationAction::Allow,
            action,
            reason,
            message: reason.message(action),
            tier_flow: Vec::new(),
            matches: Vec::new(),
            tier1: None,
            tier2: None,
            tier3: None,
            queue_item_id: None,
        }
    }

    pub fn allow() -> Self {
        Self::decided(ModerationAction::Allow, ModerationReason::None)
    }

    pub fn reject(reason: ModerationReason) -> Self {
        Self::decided(ModerationAction::Reject, reason)
    }
}
