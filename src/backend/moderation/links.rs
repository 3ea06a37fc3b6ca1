/**
 * Tier 2: Link Safety Checker
 *
 * Extracts URLs from content and asks the link reputation service about each
 * one. Lookups go through the shared fallback policy, so a slow, failing or
 * rate-limiting service yields `unknown` verdicts instead of an error, and
 * content is never rejected because the service was down.
 *
 * # Extraction
 *
 * Candidates are `http://` / `https://` runs of non-whitespace, found
 * anywhere in the text, including glued to a preceding word. Trailing
 * sentence punctuation is stripped, each candidate must parse as a URL with a
 * host, and duplicates are dropped keeping the first appearance.
 *
 * # Limits
 *
 * At most `max_urls` distinct URLs are looked up per message. Anything past
 * the cap is reported as `unknown` without a lookup.
 */

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use url::Url;

use super::clock::{Clock, SystemClock};
use super::fallback::FallbackPolicy;
use super::link_cache::{LinkVerdictCache, DEFAULT_LINK_CACHE_CAPACITY, DEFAULT_LINK_CACHE_TTL};
use super::reputation::LinkReputation;
use crate::shared::moderation::{CheckedUrl, LinkCheckReport, LinkVerdict};

pub const DEFAULT_MAX_URLS_PER_MESSAGE: usize = 10;

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"'];

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn url_pattern() -> &'static Regex {
    URL_PATTERN.get_or_init(|| Regex::new(r"(?i)https?://[^\s<>]+").expect("valid URL regex"))
}

/// Distinct, parseable URLs in `text`, in order of first appearance
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    url_pattern()
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .filter(|candidate| {
            Url::parse(candidate)
                .map(|parsed| parsed.host_str().is_some_and(|host| !host.is_empty()))
                .unwrap_or(false)
        })
        .filter(|candidate| seen.insert(candidate.to_string()))
        .map(str::to_string)
        .collect()
}

/// Cache and lookup limits for the link checker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkCheckSettings {
    pub max_urls: usize,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for LinkCheckSettings {
    fn default() -> Self {
        Self {
            max_urls: DEFAULT_MAX_URLS_PER_MESSAGE,
            cache_ttl: DEFAULT_LINK_CACHE_TTL,
            cache_capacity: DEFAULT_LINK_CACHE_CAPACITY,
        }
    }
}

pub struct LinkSafetyChecker {
    reputation: Option<Arc<dyn LinkReputation>>,
    cache: LinkVerdictCache,
    policy: FallbackPolicy,
    max_urls: usize,
}

impl LinkSafetyChecker {
    /// `reputation` is `None` when no service is configured; every URL is then unknown
    pub fn new(
        reputation: Option<Arc<dyn LinkReputation>>,
        policy: FallbackPolicy,
        settings: LinkCheckSettings,
    ) -> Self {
        Self::with_clock(reputation, policy, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        reputation: Option<Arc<dyn LinkReputation>>,
        policy: FallbackPolicy,
        settings: LinkCheckSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reputation,
            cache: LinkVerdictCache::new(settings.cache_ttl, settings.cache_capacity, clock),
            policy,
            max_urls: settings.max_urls,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.reputation.is_some()
    }

    pub fn cache(&self) -> &LinkVerdictCache {
        &self.cache
    }

    /// Check every URL in `text`. Never fails.
    pub async fn check_links(&self, text: &str) -> LinkCheckReport {
        let urls = extract_urls(text);
        let mut checked_urls = Vec::with_capacity(urls.len());

        for (index, url) in urls.into_iter().enumerate() {
            if index >= self.max_urls {
                checked_urls.push(CheckedUrl {
                    url,
                    verdict: LinkVerdict::Unknown,
                    cached: false,
                });
                continue;
            }
            checked_urls.push(self.check_url(url).await);
        }

        if checked_urls.len() > self.max_urls {
            tracing::info!(
                total = checked_urls.len(),
                max = self.max_urls,
                "Message has more links than are looked up"
            );
        }

        LinkCheckReport {
            has_malicious_link: checked_urls
                .iter()
                .any(|checked| checked.verdict == LinkVerdict::Malicious),
            checked_urls,
        }
    }

    async fn check_url(&self, url: String) -> CheckedUrl {
        if let Some(verdict) = self.cache.get(&url) {
            return CheckedUrl {
                url,
                verdict,
                cached: true,
            };
        }

        let Some(reputation) = &self.reputation else {
            return CheckedUrl {
                url,
                verdict: LinkVerdict::Unknown,
                cached: false,
            };
        };

        let verdict = self
            .policy
            .run("link_reputation", LinkVerdict::Unknown, || reputation.lookup(&url))
            .await
            .into_value();

        self.cache.insert(&url, verdict);
        if verdict == LinkVerdict::Malicious {
            tracing::info!(url = %url, "Malicious link detected");
        }

        CheckedUrl {
            url,
            verdict,
            cached: false,
        }
    }
}
