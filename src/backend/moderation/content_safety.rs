/**
 * Azure AI Content Safety Client
 *
 * [`ContentClassifier`] adapter for the Azure AI Content Safety REST API:
 *
 * ```text
 * POST {endpoint}/contentsafety/text:analyze?api-version=2023-10-01
 * POST {endpoint}/contentsafety/image:analyze?api-version=2023-10-01
 * Ocp-Apim-Subscription-Key: {key}
 * ```
 *
 * Requests ask for the four harm categories with `FourSeverityLevels`
 * output, so severities come back as 0, 2, 4 or 6. Categories missing from
 * the response score 0.
 */

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::classifier::ContentClassifier;
use super::error::ServiceError;
use crate::shared::config::ServiceConfig;
use crate::shared::moderation::config::MAX_SEVERITY;
use crate::shared::moderation::{Category, CategoryScores};

pub const API_VERSION: &str = "2023-10-01";

const REQUESTED_CATEGORIES: [&str; 4] = ["Hate", "Sexual", "Violence", "SelfHarm"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextAnalyzeRequest<'a> {
    text: &'a str,
    categories: [&'static str; 4],
    output_type: &'static str,
}

#[derive(Serialize)]
struct ImageData {
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageAnalyzeRequest {
    image: ImageData,
    categories: [&'static str; 4],
    output_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    #[serde(default)]
    categories_analysis: Vec<CategoryAnalysis>,
}

#[derive(Debug, Deserialize)]
struct CategoryAnalysis {
    category: String,
    #[serde(default)]
    severity: Option<u8>,
}

impl AnalyzeResponse {
    fn into_scores(self) -> CategoryScores {
        let mut scores = CategoryScores::default();
        for analysis in self.categories_analysis {
            let category = match analysis.category.as_str() {
                "Hate" => Category::Hate,
                "Sexual" => Category::Sexual,
                "Violence" => Category::Violence,
                "SelfHarm" => Category::SelfHarm,
                other => {
                    tracing::debug!(category = other, "Ignoring unrequested category");
                    continue;
                }
            };
            let severity = analysis.severity.unwrap_or(0).min(MAX_SEVERITY);
            scores.set(category, scores.get(category).max(severity));
        }
        scores
    }
}

pub struct ContentSafetyClient {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl ContentSafetyClient {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    async fn analyze<B: Serialize + Sync>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<CategoryScores, ServiceError> {
        let endpoint = self.config.url(&format!("contentsafety/{}", operation));

        let response = self
            .http
            .post(&endpoint)
            .query(&[("api-version", API_VERSION)])
            .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::RateLimited);
        }
        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
            });
        }

        let analysis: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        Ok(analysis.into_scores())
    }
}

#[async_trait]
impl ContentClassifier for ContentSafetyClient {
    async fn analyze_text(&self, text: &str) -> Result<CategoryScores, ServiceError> {
        let body = TextAnalyzeRequest {
            text,
            categories: REQUESTED_CATEGORIES,
            output_type: "FourSeverityLevels",
        };
        self.analyze("text:analyze", &body).await
    }

    async fn analyze_image(&self, image: &[u8]) -> Result<CategoryScores, ServiceError> {
        let body = ImageAnalyzeRequest {
            image: ImageData {
                content: STANDARD.encode(image),
            },
            categories: REQUESTED_CATEGORIES,
            output_type: "FourSeverityLevels",
        };
        self.analyze("image:analyze", &body).await
    }
}
