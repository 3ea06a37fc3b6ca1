/**
 * Tier 3: AI Content Classifier
 *
 * [`ContentClassifier`] is the seam to the external AI moderation service.
 * It scores text and images per harm category on a 0-6 severity scale.
 * [`AiClassifier`] wraps it for the pipeline: it runs the calls under the
 * fallback policy, merges text and image scores (per-category maximum) and
 * compares them against the configured thresholds.
 *
 * When the service is unavailable or not configured the tier fails open and
 * the orchestrator records that in the tier flow.
 */

use std::sync::Arc;

use async_trait::async_trait;

use super::error::ServiceError;
use super::fallback::{FallbackPolicy, Guarded};
use crate::shared::moderation::{CategoryScores, Classification, Thresholds};

/// Scores content per harm category
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    async fn analyze_text(&self, text: &str) -> Result<CategoryScores, ServiceError>;

    async fn analyze_image(&self, image: &[u8]) -> Result<CategoryScores, ServiceError>;
}

/// Result of running tier 3
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierOutcome {
    Classified(Classification),
    /// The classifier could not produce a verdict; content is let through
    FailedOpen { reason: String },
}

pub struct AiClassifier {
    classifier: Option<Arc<dyn ContentClassifier>>,
    policy: FallbackPolicy,
}

impl AiClassifier {
    pub fn new(classifier: Option<Arc<dyn ContentClassifier>>, policy: FallbackPolicy) -> Self {
        Self { classifier, policy }
    }

    pub fn is_configured(&self) -> bool {
        self.classifier.is_some()
    }

    /// Classify `text` and the optional `image` against `thresholds`.
    ///
    /// A partial failure (say the image call fails) still yields a violation
    /// if the part that did succeed crosses a threshold.
    pub async fn classify(
        &self,
        text: &str,
        image: Option<&[u8]>,
        thresholds: &Thresholds,
    ) -> ClassifierOutcome {
        let Some(classifier) = &self.classifier else {
            return ClassifierOutcome::FailedOpen {
                reason: "classifier not configured".to_string(),
            };
        };

        let mut scores: Option<CategoryScores> = None;
        let mut failures = Vec::new();

        if !text.trim().is_empty() {
            let outcome = self
                .policy
                .run("content_safety_text", None, || async {
                    classifier.analyze_text(text).await.map(Some)
                })
                .await;
            merge(&mut scores, &mut failures, "text", outcome);
        }

        if let Some(image) = image {
            let outcome = self
                .policy
                .run("content_safety_image", None, || async {
                    classifier.analyze_image(image).await.map(Some)
                })
                .await;
            merge(&mut scores, &mut failures, "image", outcome);
        }

        let classification = scores.map(|scores| Classification::evaluate(scores, thresholds));
        match classification {
            Some(classification) if classification.violates_threshold || failures.is_empty() => {
                ClassifierOutcome::Classified(classification)
            }
            _ if failures.is_empty() => ClassifierOutcome::FailedOpen {
                reason: "nothing to classify".to_string(),
            },
            _ => ClassifierOutcome::FailedOpen {
                reason: failures.join("; "),
            },
        }
    }
}

fn merge(
    scores: &mut Option<CategoryScores>,
    failures: &mut Vec<String>,
    part: &str,
    outcome: Guarded<Option<CategoryScores>>,
) {
    match outcome {
        Guarded::Completed(Some(part_scores)) => {
            *scores = Some(match scores.take() {
                Some(existing) => existing.max(part_scores),
                None => part_scores,
            });
        }
        Guarded::Completed(None) => {}
        Guarded::FellBack { error, .. } => failures.push(format!("{} analysis failed: {}", part, error)),
    }
}
