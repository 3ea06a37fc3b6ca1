//! Moderation Module
//!
//! The tiered content moderation pipeline and the state it depends on.
//!
//! # Architecture
//!
//! - **`blocklist`** - tier 1, local keyword matching
//! - **`links`** / **`link_cache`** / **`reputation`** - tier 2, link safety
//!   lookups with a TTL verdict cache
//! - **`classifier`** / **`content_safety`** - tier 3, AI category scoring
//! - **`fallback`** / **`clock`** - timeout, retry and fail-open policy for
//!   external calls; injectable time source
//! - **`orchestrator`** - runs the tiers and decides allow / pending / reject
//! - **`config_store`** / **`queue`** / **`users`** - persisted config,
//!   review queue and user block state
//! - **`handlers`** - axum handlers for the moderation API
//! - **`error`** - service and core error types
//!
//! # Module Structure
//!
//! ```text
//! moderation/
//! ├── mod.rs
//! ├── error.rs
//! ├── clock.rs
//! ├── fallback.rs
//! ├── blocklist.rs
//! ├── link_cache.rs
//! ├── reputation.rs
//! ├── links.rs
//! ├── classifier.rs
//! ├── content_safety.rs
//! ├── config_store.rs
//! ├── queue.rs
//! ├── users.rs
//! ├── orchestrator.rs
//! └── handlers.rs
//! ```

pub mod blocklist;
pub mod classifier;
pub mod clock;
pub mod config_store;
pub mod content_safety;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod link_cache;
pub mod links;
pub mod orchestrator;
pub mod queue;
pub mod reputation;
pub mod users;

pub use blocklist::match_blocklist;
pub use classifier::{AiClassifier, ClassifierOutcome, ContentClassifier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config_store::ConfigStore;
pub use content_safety::ContentSafetyClient;
pub use error::{ModerationError, ServiceError};
pub use fallback::{Backoff, FallbackPolicy, Guarded};
pub use links::{extract_urls, LinkCheckSettings, LinkSafetyChecker};
pub use orchestrator::{ModerationRequest, ModerationService};
pub use queue::{ModerationQueue, NewQueueItem};
pub use reputation::{LinkReputation, VirusTotalClient};
pub use users::UserModerationStore;
