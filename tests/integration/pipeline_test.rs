//! Moderation pipeline integration tests
//!
//! Runs `ModerationService` end to end on the in-memory store with fake
//! external services.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use townsquare::backend::moderation::{LinkCheckSettings, ModerationRequest};
use townsquare::shared::moderation::{
    CategoryScores, LinkVerdict, ModerationAction, ModerationConfigPatch, ModerationReason,
    QueueStatus, Tier, Tier3Action, TierVerdict, ThresholdsPatch, Workflow, WorkflowProfilePatch,
    MAX_CONTENT_LENGTH,
};

use crate::common::{
    scores_with, text_request, Behavior, FakeClassifier, FakeReputation, TestHarness,
};

fn verdicts(result: &townsquare::shared::moderation::ModerationResult) -> Vec<(Tier, TierVerdict)> {
    result
        .tier_flow
        .iter()
        .map(|step| (step.tier, step.verdict))
        .collect()
}

#[tokio::test]
async fn test_blocklist_match_short_circuits() {
    let harness = TestHarness::benign();
    harness.set_blocklist(&["spam"]).await;

    let result = harness
        .service
        .moderate_content(text_request("buy SPAM now http://shop.example.com"))
        .await
        .unwrap();

    assert!(!result.allowed);
    assert_eq!(result.action, ModerationAction::Reject);
    assert_eq!(result.reason, ModerationReason::Tier1KeywordMatch);
    assert_eq!(result.matches, vec!["spam".to_string()]);
    assert_eq!(verdicts(&result), vec![(Tier::Tier1, TierVerdict::Block)]);
    assert_eq!(harness.reputation.calls(), 0);
    assert_eq!(harness.classifier.calls(), 0);
}

#[tokio::test]
async fn test_clean_text_is_allowed() {
    let harness = TestHarness::benign();
    harness.set_blocklist(&["spam"]).await;

    let result = harness
        .service
        .moderate_content(text_request("see you at the picnic on Saturday"))
        .await
        .unwrap();

    assert!(result.allowed);
    assert_eq!(result.reason, ModerationReason::None);
    assert_eq!(
        verdicts(&result),
        vec![
            (Tier::Tier1, TierVerdict::Clear),
            (Tier::Tier2, TierVerdict::Clear),
            (Tier::Tier3, TierVerdict::Clear),
        ]
    );
    assert_eq!(result.tier_flow[1].detail, "no links");
    assert_eq!(harness.reputation.calls(), 0);
}

#[tokio::test]
async fn test_malicious_link_rejected_regardless_of_classifier() {
    let harness = TestHarness::new(
        FakeReputation::clean().with(
            "http://evil.example.com",
            Behavior::Respond(LinkVerdict::Malicious),
        ),
        FakeClassifier::failing(),
    );

    let result = harness
        .service
        .moderate_content(text_request("click here http://evil.example.com"))
        .await
        .unwrap();

    assert!(!result.allowed);
    assert_eq!(result.reason, ModerationReason::Tier2MaliciousLink);
    assert_eq!(
        verdicts(&result),
        vec![
            (Tier::Tier1, TierVerdict::Clear),
            (Tier::Tier2, TierVerdict::Block),
        ]
    );
    let report = result.tier2.unwrap();
    assert!(report.has_malicious_link);
    assert_eq!(report.checked_urls[0].url, "http://evil.example.com");
    assert_eq!(harness.classifier.calls(), 0);
}

#[tokio::test]
async fn test_malicious_link_glued_to_word_rejected() {
    let harness = TestHarness::new(
        FakeReputation::clean().with(
            "http://evil.example.com",
            Behavior::Respond(LinkVerdict::Malicious),
        ),
        FakeClassifier::benign(),
    );

    let result = harness
        .service
        .moderate_content(text_request("clickhttp://evil.example.com"))
        .await
        .unwrap();

    assert!(!result.allowed);
    assert_eq!(result.reason, ModerationReason::Tier2MaliciousLink);
    assert_eq!(
        verdicts(&result),
        vec![
            (Tier::Tier1, TierVerdict::Clear),
            (Tier::Tier2, TierVerdict::Block),
        ]
    );
    assert_eq!(harness.reputation.calls(), 1);
}

#[tokio::test]
async fn test_reputation_error_fails_open_to_tier3() {
    let harness = TestHarness::new(
        FakeReputation::new(Behavior::Fail),
        FakeClassifier::benign(),
    );

    let result = harness
        .service
        .moderate_content(text_request("docs at https://docs.example.org/start"))
        .await
        .unwrap();

    assert!(result.allowed);
    assert_eq!(
        verdicts(&result),
        vec![
            (Tier::Tier1, TierVerdict::Clear),
            (Tier::Tier2, TierVerdict::FailedOpen),
            (Tier::Tier3, TierVerdict::Clear),
        ]
    );
    assert_eq!(harness.classifier.calls(), 1);
}

#[tokio::test]
async fn test_reputation_timeout_fails_open() {
    let harness = TestHarness::new(
        FakeReputation::new(Behavior::Hang),
        FakeClassifier::benign(),
    );

    let result = harness
        .service
        .moderate_content(text_request("https://slow.example.net"))
        .await
        .unwrap();

    assert!(result.allowed);
    assert_eq!(result.tier_flow[1].verdict, TierVerdict::FailedOpen);
    assert_eq!(
        result.tier2.unwrap().checked_urls[0].verdict,
        LinkVerdict::Unknown
    );
}

#[tokio::test]
async fn test_reputation_failure_with_tier3_disabled_allows() {
    let harness = TestHarness::new(FakeReputation::new(Behavior::Fail), FakeClassifier::benign());
    let mut workflows = BTreeMap::new();
    workflows.insert(
        Workflow::Groups,
        WorkflowProfilePatch {
            tier3_enabled: Some(false),
            ..Default::default()
        },
    );
    harness
        .service
        .config_store()
        .save_config(
            &ModerationConfigPatch {
                workflows: Some(workflows),
                ..Default::default()
            },
            "admin-1",
        )
        .await
        .unwrap();

    let result = harness
        .service
        .moderate_content(ModerationRequest::text(
            "user-1",
            "https://docs.example.org",
            Workflow::Groups,
        ))
        .await
        .unwrap();

    assert!(result.allowed);
    assert_eq!(result.tier_flow.len(), 2);
    assert_eq!(harness.classifier.calls(), 0);
}

#[tokio::test]
async fn test_ai_violation_queues_for_review_by_default() {
    let harness = TestHarness::new(FakeReputation::clean(), FakeClassifier::scoring(scores_with(0, 6)));

    let result = harness
        .service
        .moderate_content(text_request("I hate everyone, kill them all"))
        .await
        .unwrap();

    assert!(!result.allowed);
    assert_eq!(result.action, ModerationAction::Pending);
    assert_eq!(result.reason, ModerationReason::Tier3AiViolation);
    assert_eq!(result.tier_flow[2].verdict, TierVerdict::Review);

    let item_id = result.queue_item_id.unwrap();
    let item = harness.service.queue().get(item_id).await.unwrap();
    assert_eq!(item.status, QueueStatus::Pending);
    assert_eq!(item.triggering_tier, Tier::Tier3);
    assert_eq!(item.text, "I hate everyone, kill them all");
    assert_eq!(item.category_scores.unwrap().violence, 6);
    assert_eq!(item.tier_flow, result.tier_flow);
}

#[tokio::test]
async fn test_ai_violation_rejects_when_configured() {
    let harness = TestHarness::new(FakeReputation::clean(), FakeClassifier::scoring(scores_with(0, 6)));
    harness
        .set_tier3_action(Workflow::Community, Tier3Action::Reject)
        .await;

    let result = harness
        .service
        .moderate_content(text_request("I hate everyone, kill them all"))
        .await
        .unwrap();

    assert!(!result.allowed);
    assert_eq!(result.action, ModerationAction::Reject);
    assert_eq!(result.reason, ModerationReason::Tier3AiViolation);
    assert!(result.queue_item_id.is_none());
    assert_eq!(
        result.tier3.unwrap().violated_categories,
        vec![townsquare::shared::moderation::Category::Violence]
    );
}

#[tokio::test]
async fn test_scores_below_threshold_allowed() {
    let harness = TestHarness::new(FakeReputation::clean(), FakeClassifier::scoring(scores_with(2, 3)));

    let result = harness
        .service
        .moderate_content(text_request("that movie was brutal"))
        .await
        .unwrap();

    assert!(result.allowed);
    assert!(!result.tier3.unwrap().violates_threshold);
}

#[tokio::test]
async fn test_lowered_threshold_takes_effect() {
    let harness = TestHarness::new(FakeReputation::clean(), FakeClassifier::scoring(scores_with(3, 0)));
    harness
        .service
        .config_store()
        .save_config(
            &ModerationConfigPatch {
                thresholds: Some(ThresholdsPatch {
                    hate: Some(3),
                    ..Default::default()
                }),
                ..Default::default()
            },
            "admin-1",
        )
        .await
        .unwrap();

    let result = harness
        .service
        .moderate_content(text_request("borderline remark"))
        .await
        .unwrap();

    assert_eq!(result.action, ModerationAction::Pending);
}

#[tokio::test]
async fn test_classifier_failure_fails_open() {
    let harness = TestHarness::new(FakeReputation::clean(), FakeClassifier::failing());

    let result = harness
        .service
        .moderate_content(text_request("hello there"))
        .await
        .unwrap();

    assert!(result.allowed);
    assert_eq!(result.tier_flow[2].verdict, TierVerdict::FailedOpen);
    assert!(result.tier3.is_none());
}

#[tokio::test]
async fn test_image_violation_counts_when_text_fails() {
    let harness = TestHarness::new(
        FakeReputation::clean(),
        FakeClassifier::new(
            Behavior::Fail,
            Behavior::Respond(CategoryScores {
                sexual: 6,
                ..CategoryScores::default()
            }),
        ),
    );
    let mut request = text_request("look at this");
    request.image = Some(b"\x89PNG".to_vec());

    let result = harness.service.moderate_content(request).await.unwrap();

    assert_eq!(result.action, ModerationAction::Pending);
    let item = harness
        .service
        .queue()
        .get(result.queue_item_id.unwrap())
        .await
        .unwrap();
    assert!(item.has_image);
}

#[tokio::test]
async fn test_trusted_workflow_skips_every_tier() {
    let harness = TestHarness::new(
        FakeReputation::new(Behavior::Respond(LinkVerdict::Malicious)),
        FakeClassifier::scoring(scores_with(6, 6)),
    );
    harness.set_blocklist(&["spam"]).await;

    let result = harness
        .service
        .moderate_content(ModerationRequest::text(
            "staff-1",
            "spam http://evil.example.com",
            Workflow::Trusted,
        ))
        .await
        .unwrap();

    assert!(result.allowed);
    assert!(result.tier_flow.is_empty());
    assert_eq!(harness.reputation.calls(), 0);
    assert_eq!(harness.classifier.calls(), 0);
}

#[tokio::test]
async fn test_trusted_workflow_still_validates_content() {
    let harness = TestHarness::benign();

    for text in ["", "   "] {
        let result = harness
            .service
            .moderate_content(ModerationRequest::text("staff-1", text, Workflow::Trusted))
            .await
            .unwrap();

        assert!(!result.allowed);
        assert_eq!(result.action, ModerationAction::Reject);
        assert_eq!(result.reason, ModerationReason::EmptyContent);
        assert!(result.tier_flow.is_empty());
    }

    let long = "a".repeat(MAX_CONTENT_LENGTH + 1);
    let oversized = harness
        .service
        .moderate_content(ModerationRequest::text("staff-1", long, Workflow::Trusted))
        .await
        .unwrap();
    assert_eq!(oversized.reason, ModerationReason::ContentTooLong);
}

#[tokio::test]
async fn test_empty_and_oversized_content_rejected() {
    let harness = TestHarness::benign();

    let empty = harness
        .service
        .moderate_content(text_request("   "))
        .await
        .unwrap();
    assert_eq!(empty.reason, ModerationReason::EmptyContent);
    assert!(empty.tier_flow.is_empty());

    let long = "a".repeat(MAX_CONTENT_LENGTH + 1);
    let oversized = harness
        .service
        .moderate_content(text_request(&long))
        .await
        .unwrap();
    assert_eq!(oversized.reason, ModerationReason::ContentTooLong);
    assert_eq!(harness.classifier.calls(), 0);
}

#[tokio::test]
async fn test_repeated_link_served_from_cache() {
    let harness = TestHarness::benign();

    for _ in 0..3 {
        let result = harness
            .service
            .moderate_content(text_request("https://news.example.com/today"))
            .await
            .unwrap();
        assert!(result.allowed);
    }

    assert_eq!(harness.reputation.calls(), 1);
    assert_eq!(harness.service.links().cache().len(), 1);
}

#[tokio::test]
async fn test_links_beyond_limit_are_not_looked_up() {
    let harness = TestHarness::with_settings(
        FakeReputation::clean(),
        FakeClassifier::benign(),
        LinkCheckSettings {
            max_urls: 2,
            ..LinkCheckSettings::default()
        },
    );

    let result = harness
        .service
        .moderate_content(text_request(
            "https://a.example.com https://b.example.com https://c.example.com",
        ))
        .await
        .unwrap();

    assert_eq!(harness.reputation.calls(), 2);
    let report = result.tier2.unwrap();
    assert_eq!(report.checked_urls.len(), 3);
    assert_eq!(report.checked_urls[2].verdict, LinkVerdict::Unknown);
    assert_eq!(result.tier_flow[1].verdict, TierVerdict::FailedOpen);
}

#[tokio::test]
async fn test_blocked_user_rejected_before_tiers() {
    let harness = TestHarness::benign();
    harness
        .service
        .users()
        .set_block_status("user-1", true, Some("spamming".to_string()), "admin-1")
        .await
        .unwrap();

    let result = harness
        .service
        .check_content(text_request("hello"))
        .await
        .unwrap();

    assert!(!result.allowed);
    assert_eq!(result.reason, ModerationReason::UserBlocked);
    assert!(result.tier_flow.is_empty());
    assert_eq!(harness.classifier.calls(), 0);
}
