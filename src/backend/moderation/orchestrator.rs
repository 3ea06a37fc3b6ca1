/**
 * Tier Orchestrator
 *
 * [`ModerationService`] runs a piece of content through the pipeline and
 * decides what happens to it:
 *
 * ```text
 * validate ─▶ load config ─▶ tier 1 ─▶ tier 2 ─▶ tier 3 ─▶ allow
 *                             │         │         │
 *                           reject    reject    reject | pending (queued)
 * ```
 *
 * Tiers run strictly in order and only when the workflow's profile enables
 * them. A hard block short-circuits the remaining tiers. Every tier that
 * runs appends one entry to the result's tier flow, including tiers that
 * failed open because their external service was unavailable.
 *
 * The service also owns the config store, review queue and user block
 * state so the HTTP layer has one handle for all moderation operations.
 */

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::blocklist::match_blocklist;
use super::classifier::{AiClassifier, ClassifierOutcome};
use super::config_store::ConfigStore;
use super::error::ModerationError;
use super::links::LinkSafetyChecker;
use super::queue::{ModerationQueue, NewQueueItem};
use super::users::UserModerationStore;
use crate::shared::moderation::{
    CheckContentRequest, ContentType, ModerationAction, ModerationReason, ModerationResult,
    Tier, Tier3Action, TierStep, TierVerdict, Workflow, MAX_CONTENT_LENGTH,
};
use crate::shared::SharedError;

/// Content to moderate, with its author
#[derive(Debug, Clone, Default)]
pub struct ModerationRequest {
    pub content_type: ContentType,
    pub text: String,
    /// Raw image bytes
    pub image: Option<Vec<u8>>,
    pub user_id: String,
    pub user_email: Option<String>,
    pub content_id: Option<String>,
    pub channel_id: Option<String>,
    pub workflow: Workflow,
}

impl ModerationRequest {
    pub fn text(user_id: impl Into<String>, text: impl Into<String>, workflow: Workflow) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            workflow,
            ..Default::default()
        }
    }

    /// Build a request from the check endpoint's body and the caller's identity
    pub fn from_check(
        request: CheckContentRequest,
        user_id: impl Into<String>,
        user_email: Option<String>,
    ) -> Result<Self, SharedError> {
        let image = match request.image_base64.as_deref().map(str::trim) {
            Some(encoded) if !encoded.is_empty() => Some(
                STANDARD
                    .decode(encoded)
                    .map_err(|e| SharedError::validation("imageBase64", e.to_string()))?,
            ),
            _ => None,
        };

        Ok(Self {
            content_type: request.content_type,
            text: request.text,
            image,
            user_id: user_id.into(),
            user_email,
            content_id: request.content_id,
            channel_id: request.channel_id,
            workflow: request.workflow,
        })
    }
}

pub struct ModerationService {
    config: Arc<ConfigStore>,
    queue: Arc<ModerationQueue>,
    users: Arc<UserModerationStore>,
    links: Arc<LinkSafetyChecker>,
    classifier: Arc<AiClassifier>,
}

impl ModerationService {
    pub fn new(
        config: Arc<ConfigStore>,
        queue: Arc<ModerationQueue>,
        users: Arc<UserModerationStore>,
        links: Arc<LinkSafetyChecker>,
        classifier: Arc<AiClassifier>,
    ) -> Self {
        Self {
            config,
            queue,
            users,
            links,
            classifier,
        }
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.config
    }

    pub fn queue(&self) -> &ModerationQueue {
        &self.queue
    }

    pub fn users(&self) -> &UserModerationStore {
        &self.users
    }

    pub fn links(&self) -> &LinkSafetyChecker {
        &self.links
    }

    /// Entry point for the check endpoint: blocked authors are rejected
    /// before any tier runs
    pub async fn check_content(
        &self,
        request: ModerationRequest,
    ) -> Result<ModerationResult, ModerationError> {
        if self.users.is_blocked(&request.user_id).await? {
            tracing::info!(user_id = %request.user_id, "Rejected content from blocked user");
            return Ok(ModerationResult::reject(ModerationReason::UserBlocked));
        }
        self.moderate_content(request).await
    }

    /// Run `request` through the tiers enabled for its workflow.
    ///
    /// Only a failure to persist a review item is returned as an error;
    /// external service failures fail open and a config store failure falls
    /// back to the default config.
    pub async fn moderate_content(
        &self,
        request: ModerationRequest,
    ) -> Result<ModerationResult, ModerationError> {
        if request.text.trim().is_empty() && request.image.is_none() {
            return Ok(ModerationResult::reject(ModerationReason::EmptyContent));
        }
        if request.text.chars().count() > MAX_CONTENT_LENGTH {
            return Ok(ModerationResult::reject(ModerationReason::ContentTooLong));
        }

        let config = self.config.get_config_or_default().await;
        let profile = config.profile(request.workflow);
        let mut tier_flow = Vec::new();

        // Tier 1: keyword blocklist
        let mut tier1 = None;
        if profile.tier1_enabled {
            let matched = match_blocklist(
                &request.text,
                &config.blocklist_terms,
                config.blocklist_match_mode,
            );
            if matched.matched {
                tier_flow.push(TierStep::new(
                    Tier::Tier1,
                    TierVerdict::Block,
                    format!("matched {} blocklist term(s)", matched.matches.len()),
                ));
                let mut result = ModerationResult::reject(ModerationReason::Tier1KeywordMatch);
                result.matches = matched.matches.clone();
                result.tier1 = Some(matched);
                result.tier_flow = tier_flow;
                log_decision(&request, &result);
                return Ok(result);
            }
            tier_flow.push(TierStep::new(Tier::Tier1, TierVerdict::Clear, "no blocklist match"));
            tier1 = Some(matched);
        }

        // Tier 2: link safety
        let mut tier2 = None;
        if profile.tier2_enabled {
            let report = self.links.check_links(&request.text).await;
            if report.has_malicious_link {
                let flagged: Vec<&str> = report.malicious_urls().collect();
                tier_flow.push(TierStep::new(
                    Tier::Tier2,
                    TierVerdict::Block,
                    format!("malicious link(s): {}", flagged.join(", ")),
                ));
                let mut result = ModerationResult::reject(ModerationReason::Tier2MaliciousLink);
                result.tier1 = tier1;
                result.tier2 = Some(report);
                result.tier_flow = tier_flow;
                log_decision(&request, &result);
                return Ok(result);
            }

            let unknown = report.unknown_count();
            let step = if report.checked_urls.is_empty() {
                TierStep::new(Tier::Tier2, TierVerdict::Clear, "no links")
            } else if unknown > 0 {
                tracing::warn!(
                    user_id = %request.user_id,
                    unknown,
                    "Link safety could not be determined, allowing links"
                );
                TierStep::new(
                    Tier::Tier2,
                    TierVerdict::FailedOpen,
                    format!(
                        "{} link(s) checked, {} could not be verified",
                        report.checked_urls.len(),
                        unknown
                    ),
                )
            } else {
                TierStep::new(
                    Tier::Tier2,
                    TierVerdict::Clear,
                    format!("{} link(s) clean", report.checked_urls.len()),
                )
            };
            tier_flow.push(step);
            tier2 = Some(report);
        }

        // Tier 3: AI classification
        let mut tier3 = None;
        if profile.tier3_enabled {
            match self
                .classifier
                .classify(&request.text, request.image.as_deref(), &config.thresholds)
                .await
            {
                ClassifierOutcome::Classified(classification)
                    if classification.violates_threshold =>
                {
                    let categories: Vec<&str> = classification
                        .violated_categories
                        .iter()
                        .map(|category| category.as_str())
                        .collect();
                    let detail = format!("threshold exceeded: {}", categories.join(", "));

                    let mut result = match profile.tier3_action {
                        Tier3Action::Reject => {
                            tier_flow.push(TierStep::new(Tier::Tier3, TierVerdict::Block, detail));
                            ModerationResult::reject(ModerationReason::Tier3AiViolation)
                        }
                        Tier3Action::Review => {
                            tier_flow.push(TierStep::new(Tier::Tier3, TierVerdict::Review, detail));
                            let item = self
                                .queue
                                .enqueue(NewQueueItem {
                                    content_type: request.content_type,
                                    content_id: request.content_id.clone(),
                                    channel_id: request.channel_id.clone(),
                                    text: request.text.clone(),
                                    has_image: request.image.is_some(),
                                    user_id: request.user_id.clone(),
                                    user_email: request.user_email.clone(),
                                    workflow: request.workflow,
                                    tier_flow: tier_flow.clone(),
                                    triggering_tier: Tier::Tier3,
                                    category_scores: Some(classification.category_scores),
                                })
                                .await?;
                            let mut result = ModerationResult::decided(
                                ModerationAction::Pending,
                                ModerationReason::Tier3AiViolation,
                            );
                            result.queue_item_id = Some(item.id);
                            result
                        }
                    };
                    result.tier1 = tier1;
                    result.tier2 = tier2;
                    result.tier3 = Some(classification);
                    result.tier_flow = tier_flow;
                    log_decision(&request, &result);
                    return Ok(result);
                }
                ClassifierOutcome::Classified(classification) => {
                    tier_flow.push(TierStep::new(
                        Tier::Tier3,
                        TierVerdict::Clear,
                        "all categories below threshold",
                    ));
                    tier3 = Some(classification);
                }
                ClassifierOutcome::FailedOpen { reason } => {
                    tracing::warn!(
                        user_id = %request.user_id,
                        %reason,
                        "AI classification unavailable, allowing content"
                    );
                    tier_flow.push(TierStep::new(Tier::Tier3, TierVerdict::FailedOpen, reason));
                }
            }
        }

        let mut result = ModerationResult::allow();
        result.tier1 = tier1;
        result.tier2 = tier2;
        result.tier3 = tier3;
        result.tier_flow = tier_flow;
        tracing::debug!(
            user_id = %request.user_id,
            workflow = %request.workflow,
            tiers = result.tier_flow.len(),
            "Content allowed"
        );
        Ok(result)
    }
}

fn log_decision(request: &ModerationRequest, result: &ModerationResult) {
    tracing::info!(
        user_id = %request.user_id,
        workflow = %request.workflow,
        action = ?result.action,
        reason = %result.reason,
        "Moderation decision"
    );
}
