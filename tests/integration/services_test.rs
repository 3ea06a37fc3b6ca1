//! External service adapter tests
//!
//! Exercises the VirusTotal and Azure Content Safety clients against a
//! wiremock server, including the fail-open path through the link checker.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use townsquare::backend::moderation::content_safety::API_VERSION;
use townsquare::backend::moderation::{
    ContentClassifier, ContentSafetyClient, LinkCheckSettings, LinkReputation, LinkSafetyChecker,
    ServiceError, VirusTotalClient,
};
use townsquare::shared::config::ServiceConfig;
use townsquare::shared::moderation::{CategoryScores, LinkVerdict};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fast_policy;

fn service_config(server: &MockServer, key: &str) -> ServiceConfig {
    ServiceConfig::builder()
        .base_url(server.uri())
        .api_key(key)
        .timeout(Duration::from_millis(500))
        .build()
        .unwrap()
}

fn url_report(malicious: u32) -> serde_json::Value {
    json!({
        "data": {
            "id": "abc",
            "type": "url",
            "attributes": {
                "last_analysis_stats": {
                    "harmless": 70,
                    "malicious": malicious,
                    "suspicious": 0,
                    "undetected": 10
                }
            }
        }
    })
}

async fn mount_report(server: &MockServer, url: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v3/urls/{}", VirusTotalClient::url_id(url))))
        .and(header("x-apikey", "vt-key"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_virustotal_verdicts() {
    let server = MockServer::start().await;
    mount_report(
        &server,
        "http://evil.example.com",
        ResponseTemplate::new(200).set_body_json(url_report(3)),
    )
    .await;
    mount_report(
        &server,
        "https://docs.example.org",
        ResponseTemplate::new(200).set_body_json(url_report(0)),
    )
    .await;
    mount_report(&server, "https://new.example.net", ResponseTemplate::new(404)).await;

    let client = VirusTotalClient::new(service_config(&server, "vt-key")).unwrap();
    assert_eq!(
        client.lookup("http://evil.example.com").await.unwrap(),
        LinkVerdict::Malicious
    );
    assert_eq!(
        client.lookup("https://docs.example.org").await.unwrap(),
        LinkVerdict::Clean
    );
    assert_eq!(
        client.lookup("https://new.example.net").await.unwrap(),
        LinkVerdict::Unknown
    );
}

#[tokio::test]
async fn test_virustotal_errors() {
    let server = MockServer::start().await;
    mount_report(&server, "https://busy.example.com", ResponseTemplate::new(429)).await;
    mount_report(&server, "https://down.example.com", ResponseTemplate::new(503)).await;
    mount_report(
        &server,
        "https://garbled.example.com",
        ResponseTemplate::new(200).set_body_string("not json"),
    )
    .await;

    let client = VirusTotalClient::new(service_config(&server, "vt-key")).unwrap();
    assert_matches!(
        client.lookup("https://busy.example.com").await,
        Err(ServiceError::RateLimited)
    );
    assert_matches!(
        client.lookup("https://down.example.com").await,
        Err(ServiceError::Http { status: 503 })
    );
    assert_matches!(
        client.lookup("https://garbled.example.com").await,
        Err(ServiceError::Decode(_))
    );
}

#[tokio::test]
async fn test_link_checker_fails_open_on_slow_service() {
    let server = MockServer::start().await;
    mount_report(
        &server,
        "https://slow.example.com",
        ResponseTemplate::new(200)
            .set_body_json(url_report(5))
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let client: Arc<dyn LinkReputation> =
        Arc::new(VirusTotalClient::new(service_config(&server, "vt-key")).unwrap());
    let checker = LinkSafetyChecker::new(Some(client), fast_policy(), LinkCheckSettings::default());

    let report = checker.check_links("see https://slow.example.com").await;
    assert!(!report.has_malicious_link);
    assert_eq!(report.checked_urls[0].verdict, LinkVerdict::Unknown);
    assert!(checker.cache().is_empty());
}

#[tokio::test]
async fn test_link_checker_caches_malicious_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/api/v3/urls/{}",
            VirusTotalClient::url_id("http://evil.example.com")
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(url_report(1)))
        .expect(1)
        .mount(&server)
        .await;

    let client: Arc<dyn LinkReputation> =
        Arc::new(VirusTotalClient::new(service_config(&server, "vt-key")).unwrap());
    let checker = LinkSafetyChecker::new(Some(client), fast_policy(), LinkCheckSettings::default());

    let first = checker.check_links("http://evil.example.com").await;
    let second = checker.check_links("again http://evil.example.com").await;
    assert!(first.has_malicious_link);
    assert!(second.has_malicious_link);
    assert!(second.checked_urls[0].cached);
}

#[tokio::test]
async fn test_content_safety_text_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contentsafety/text:analyze"))
        .and(query_param("api-version", API_VERSION))
        .and(header("Ocp-Apim-Subscription-Key", "cs-key"))
        .and(body_partial_json(json!({
            "text": "kill them all",
            "outputType": "FourSeverityLevels"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blocklistsMatch": [],
            "categoriesAnalysis": [
                {"category": "Hate", "severity": 2},
                {"category": "SelfHarm", "severity": 0},
                {"category": "Sexual", "severity": 0},
                {"category": "Violence", "severity": 6}
            ]
        })))
        .mount(&server)
        .await;

    let client = ContentSafetyClient::new(service_config(&server, "cs-key")).unwrap();
    let scores = client.analyze_text("kill them all").await.unwrap();
    assert_eq!(
        scores,
        CategoryScores {
            hate: 2,
            sexual: 0,
            violence: 6,
            self_harm: 0,
        }
    );
}

#[tokio::test]
async fn test_content_safety_image_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contentsafety/image:analyze"))
        .and(body_partial_json(json!({
            "image": { "content": "iVBORw==" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categoriesAnalysis": [{"category": "Sexual", "severity": 4}]
        })))
        .mount(&server)
        .await;

    let client = ContentSafetyClient::new(service_config(&server, "cs-key")).unwrap();
    let scores = client.analyze_image(b"\x89PNG").await.unwrap();
    assert_eq!(scores.sexual, 4);
}

#[tokio::test]
async fn test_content_safety_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contentsafety/text:analyze"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = ContentSafetyClient::new(service_config(&server, "wrong-key")).unwrap();
    let err = client.analyze_text("hello").await.unwrap_err();
    assert_matches!(err, ServiceError::Http { status: 401 });
    assert!(!err.is_transient());
}
