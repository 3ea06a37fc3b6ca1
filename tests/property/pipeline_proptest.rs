//! Property-based tests for the moderation pipeline
//!
//! Each case builds a fresh harness and drives it on a current-thread runtime.

use proptest::prelude::*;
use townsquare::shared::moderation::{ModerationReason, Tier, TierVerdict};

use crate::common::{text_request, TestHarness};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_blocklisted_text_never_reaches_later_tiers(
        before in "[a-z ]{0,30}",
        after in "[a-z ]{0,30}",
        url_host in "[a-z]{3,10}",
    ) {
        let harness = TestHarness::benign();
        let text = format!("{} SCAM {} https://{}.example.com", before, after, url_host);

        let result = block_on(async {
            harness.set_blocklist(&["scam"]).await;
            harness.service.moderate_content(text_request(&text)).await.unwrap()
        });

        prop_assert!(!result.allowed);
        prop_assert_eq!(result.reason, ModerationReason::Tier1KeywordMatch);
        prop_assert_eq!(result.tier_flow.len(), 1);
        prop_assert_eq!(harness.reputation.calls(), 0);
        prop_assert_eq!(harness.classifier.calls(), 0);
    }

    #[test]
    fn test_benign_text_without_links_is_allowed(text in "[a-z]{1,12}( [a-z]{1,12}){0,8}") {
        let harness = TestHarness::benign();

        let result = block_on(harness.service.moderate_content(text_request(&text))).unwrap();

        prop_assert!(result.allowed);
        prop_assert_eq!(result.reason, ModerationReason::None);
        prop_assert_eq!(
            result.tier_flow.iter().map(|step| (step.tier, step.verdict)).collect::<Vec<_>>(),
            vec![
                (Tier::Tier1, TierVerdict::Clear),
                (Tier::Tier2, TierVerdict::Clear),
                (Tier::Tier3, TierVerdict::Clear),
            ]
        );
    }
}
