//! Fake external services
//!
//! In-process stand-ins for the link reputation and AI classification
//! services. Each fake counts its calls so tests can check caching and
//! short-circuiting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use townsquare::backend::moderation::{ContentClassifier, LinkReputation, ServiceError};
use townsquare::shared::moderation::{CategoryScores, LinkVerdict};

/// How a fake call behaves
#[derive(Debug, Clone, Copy)]
pub enum Behavior<T> {
    Respond(T),
    /// Fail with a 503
    Fail,
    /// Never answer within any sane timeout
    Hang,
}

async fn act<T: Copy>(behavior: Behavior<T>) -> Result<T, ServiceError> {
    match behavior {
        Behavior::Respond(value) => Ok(value),
        Behavior::Fail => Err(ServiceError::Http { status: 503 }),
        Behavior::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ServiceError::Timeout(Duration::from_secs(3600)))
        }
    }
}

pub struct FakeReputation {
    default: Behavior<LinkVerdict>,
    overrides: Mutex<HashMap<String, Behavior<LinkVerdict>>>,
    calls: AtomicUsize,
}

impl FakeReputation {
    pub fn new(default: Behavior<LinkVerdict>) -> Self {
        Self {
            default,
            overrides: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every URL is clean unless overridden
    pub fn clean() -> Self {
        Self::new(Behavior::Respond(LinkVerdict::Clean))
    }

    pub fn with(self, url: &str, behavior: Behavior<LinkVerdict>) -> Self {
        self.overrides
            .lock()
            .unwrap()
            .insert(url.to_string(), behavior);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkReputation for FakeReputation {
    async fn lookup(&self, url: &str) -> Result<LinkVerdict, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .overrides
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(self.default);
        act(behavior).await
    }
}

pub struct FakeClassifier {
    text: Behavior<CategoryScores>,
    image: Behavior<CategoryScores>,
    calls: AtomicUsize,
}

impl FakeClassifier {
    pub fn new(text: Behavior<CategoryScores>, image: Behavior<CategoryScores>) -> Self {
        Self {
            text,
            image,
            calls: AtomicUsize::new(0),
        }
    }

    /// Scores every category zero
    pub fn benign() -> Self {
        Self::scoring(CategoryScores::default())
    }

    /// Same scores for text and image
    pub fn scoring(scores: CategoryScores) -> Self {
        Self::new(Behavior::Respond(scores), Behavior::Respond(scores))
    }

    pub fn failing() -> Self {
        Self::new(Behavior::Fail, Behavior::Fail)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentClassifier for FakeClassifier {
    async fn analyze_text(&self, _text: &str) -> Result<CategoryScores, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        act(self.text).await
    }

    async fn analyze_image(&self, _image: &[u8]) -> Result<CategoryScores, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        act(self.image).await
    }
}

/// Scores with one category set
pub fn scores_with(hate: u8, violence: u8) -> CategoryScores {
    CategoryScores {
        hate,
        violence,
        ..CategoryScores::default()
    }
}
