/**
 * Link Reputation Service
 *
 * [`LinkReputation`] is the seam between the link safety checker and the
 * external URL reputation service. The production adapter speaks the
 * VirusTotal v3 URL report API:
 *
 * ```text
 * GET {base}/api/v3/urls/{base64url(url), unpadded}
 * x-apikey: {key}
 * ```
 *
 * # Verdict Mapping
 *
 * - report found, `last_analysis_stats.malicious > 0` - malicious
 * - report found, no engine flagged it - clean
 * - 404 (URL never analysed) - unknown
 * - 429 - `ServiceError::RateLimited`
 * - any other non-2xx - `ServiceError::Http`
 */

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;

use super::error::ServiceError;
use crate::shared::config::ServiceConfig;
use crate::shared::moderation::LinkVerdict;

/// Looks up the reputation of a single URL
#[async_trait]
pub trait LinkReputation: Send + Sync {
    async fn lookup(&self, url: &str) -> Result<LinkVerdict, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct UrlReport {
    data: UrlReportData,
}

#[derive(Debug, Deserialize)]
struct UrlReportData {
    #[serde(default)]
    attributes: UrlAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct UrlAttributes {
    #[serde(default)]
    last_analysis_stats: AnalysisStats,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisStats {
    #[serde(default)]
    malicious: u32,
}

/// VirusTotal v3 client
pub struct VirusTotalClient {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl VirusTotalClient {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// VirusTotal identifies URLs by their unpadded URL-safe base64 encoding
    pub fn url_id(url: &str) -> String {
        URL_SAFE_NO_PAD.encode(url.as_bytes())
    }
}

#[async_trait]
impl LinkReputation for VirusTotalClient {
    async fn lookup(&self, url: &str) -> Result<LinkVerdict, ServiceError> {
        let endpoint = self
            .config
            .url(&format!("api/v3/urls/{}", Self::url_id(url)));

        let response = self
            .http
            .get(&endpoint)
            .header("x-apikey", &self.config.api_key)
            .header("accept", "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(LinkVerdict::Unknown),
            StatusCode::TOO_MANY_REQUESTS => return Err(ServiceError::RateLimited),
            status if !status.is_success() => {
                return Err(ServiceError::Http {
                    status: status.as_u16(),
                })
            }
            _ => {}
        }

        let report: UrlReport = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        let malicious = report.data.attributes.last_analysis_stats.malicious;
        tracing::debug!(url, malicious, "Link reputation report received");
        if malicious > 0 {
            Ok(LinkVerdict::Malicious)
        } else {
            Ok(LinkVerdict::Clean)
        }
    }
}
