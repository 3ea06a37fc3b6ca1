//! Review queue and config store integration tests

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use townsquare::backend::moderation::ModerationError;
use townsquare::shared::moderation::{
    ListQueueQuery, MatchMode, ModerationConfigPatch, QueueStatus, ResolveQueueItemRequest,
    ThresholdsPatch,
};
use uuid::Uuid;

use crate::common::{scores_with, text_request, FakeClassifier, FakeReputation, TestHarness};

async fn harness_with_pending_item() -> (TestHarness, Uuid) {
    let harness = TestHarness::new(FakeReputation::clean(), FakeClassifier::scoring(scores_with(5, 0)));
    let result = harness
        .service
        .moderate_content(text_request("hateful remark"))
        .await
        .unwrap();
    let id = result.queue_item_id.unwrap();
    (harness, id)
}

#[tokio::test]
async fn test_second_resolution_conflicts_without_overwrite() {
    let (harness, id) = harness_with_pending_item().await;
    let queue = harness.service.queue();

    let first = queue
        .resolve(
            id,
            &ResolveQueueItemRequest {
                status: QueueStatus::Approved,
                notes: Some("satire".to_string()),
            },
            "mod-a",
        )
        .await
        .unwrap();
    assert_eq!(first.status, QueueStatus::Approved);
    assert_eq!(first.reviewed_by.as_deref(), Some("mod-a"));

    let second = queue
        .resolve(
            id,
            &ResolveQueueItemRequest {
                status: QueueStatus::Rejected,
                notes: Some("actually no".to_string()),
            },
            "mod-b",
        )
        .await;
    assert_matches!(second, Err(ModerationError::AlreadyResolved { id: conflict }) if conflict == id);

    let stored = queue.get(id).await.unwrap();
    assert_eq!(stored.status, QueueStatus::Approved);
    assert_eq!(stored.reviewed_by.as_deref(), Some("mod-a"));
    assert_eq!(stored.notes.as_deref(), Some("satire"));
}

#[tokio::test]
async fn test_concurrent_resolutions_have_one_winner() {
    let (harness, id) = harness_with_pending_item().await;

    let approve = ResolveQueueItemRequest {
        status: QueueStatus::Approved,
        notes: None,
    };
    let reject = ResolveQueueItemRequest {
        status: QueueStatus::Rejected,
        notes: None,
    };
    let (a, b) = tokio::join!(
        harness.service.queue().resolve(id, &approve, "mod-a"),
        harness.service.queue().resolve(id, &reject, "mod-b"),
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let stored = harness.service.queue().get(id).await.unwrap();
    assert!(stored.status.is_terminal());
}

#[tokio::test]
async fn test_resolve_to_pending_is_rejected() {
    let (harness, id) = harness_with_pending_item().await;
    let err = harness
        .service
        .queue()
        .resolve(
            id,
            &ResolveQueueItemRequest {
                status: QueueStatus::Pending,
                notes: None,
            },
            "mod-a",
        )
        .await
        .unwrap_err();
    assert_matches!(err, ModerationError::Validation(_));
}

#[tokio::test]
async fn test_resolve_unknown_item() {
    let harness = TestHarness::benign();
    let err = harness
        .service
        .queue()
        .resolve(
            Uuid::new_v4(),
            &ResolveQueueItemRequest {
                status: QueueStatus::Approved,
                notes: None,
            },
            "mod-a",
        )
        .await
        .unwrap_err();
    assert_matches!(err, ModerationError::NotFound { .. });
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let harness = TestHarness::new(FakeReputation::clean(), FakeClassifier::scoring(scores_with(5, 0)));
    let mut ids = Vec::new();
    for text in ["first", "second", "third"] {
        let result = harness
            .service
            .moderate_content(text_request(text))
            .await
            .unwrap();
        ids.push(result.queue_item_id.unwrap());
    }
    harness
        .service
        .queue()
        .resolve(
            ids[0],
            &ResolveQueueItemRequest {
                status: QueueStatus::Rejected,
                notes: None,
            },
            "mod-a",
        )
        .await
        .unwrap();

    let pending = harness
        .service
        .queue()
        .list(ListQueueQuery {
            status: Some(QueueStatus::Pending),
            limit: None,
        })
        .await
        .unwrap();
    let texts: Vec<&str> = pending.iter().map(|item| item.text.as_str()).collect();
    assert_eq!(texts, vec!["third", "second"]);

    let limited = harness
        .service
        .queue()
        .list(ListQueueQuery {
            status: None,
            limit: Some(1),
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].text, "third");
}

#[tokio::test]
async fn test_partial_config_update_round_trip() {
    let harness = TestHarness::benign();
    let store = harness.service.config_store();
    harness.set_blocklist(&["Spam", " scam "]).await;
    let before = store.get_config().await.unwrap();

    store
        .save_config(
            &ModerationConfigPatch {
                thresholds: Some(ThresholdsPatch {
                    hate: Some(3),
                    ..Default::default()
                }),
                ..Default::default()
            },
            "admin-2",
        )
        .await
        .unwrap();

    store.invalidate().await;
    let after = store.get_config().await.unwrap();
    assert_eq!(after.thresholds.hate, 3);
    assert_eq!(after.thresholds.sexual, before.thresholds.sexual);
    assert_eq!(after.thresholds.violence, before.thresholds.violence);
    assert_eq!(after.thresholds.self_harm, before.thresholds.self_harm);
    assert_eq!(after.blocklist_terms, before.blocklist_terms);
    assert_eq!(after.blocklist_match_mode, MatchMode::WholeWord);
    assert_eq!(after.workflows, before.workflows);
    assert_eq!(after.updated_by.as_deref(), Some("admin-2"));
    assert!(after.blocklist_terms.contains("scam"));
}

#[tokio::test]
async fn test_invalid_threshold_leaves_config_untouched() {
    let harness = TestHarness::benign();
    let store = harness.service.config_store();
    let before = store.get_config().await.unwrap();

    let err = store
        .save_config(
            &ModerationConfigPatch {
                thresholds: Some(ThresholdsPatch {
                    violence: Some(9),
                    ..Default::default()
                }),
                ..Default::default()
            },
            "admin-1",
        )
        .await
        .unwrap_err();
    assert_matches!(err, ModerationError::Validation(_));

    store.invalidate().await;
    assert_eq!(store.get_config().await.unwrap(), before);
}
