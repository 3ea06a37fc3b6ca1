//! Document Store
//!
//! The moderation core persists three kinds of records (config, queue items,
//! user block state) as JSON documents in named collections. This module
//! defines the narrow store contract and its two adapters:
//!
//! - **`postgres`** - JSONB documents in a single `documents` table (sqlx)
//! - **`memory`** - process-local map, used by tests and when no database is
//!   configured
//!
//! Every document carries a `version` that `replace` increments. Passing the
//! version read earlier as `expected_version` turns `replace` into a
//! compare-and-swap, which is how concurrent queue resolutions are detected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Collection names used by the moderation core
pub mod collections {
    pub const MODERATION_CONFIG: &str = "moderationConfig";
    pub const MODERATION_QUEUE: &str = "moderationQueue";
    pub const USER_MODERATION: &str = "userModeration";
}

/// A stored JSON document with its bookkeeping columns
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub version: i64,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Deserialize the body into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Filter for [`DocumentStore::query`]: top-level field equality, creation
/// order and an optional limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    pub equals: Vec<(String, Value)>,
    pub newest_first: bool,
    pub limit: Option<usize>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `body` satisfies every equality clause
    pub fn matches(&self, body: &Value) -> bool {
        self.equals
            .iter()
            .all(|(field, expected)| body.get(field) == Some(expected))
    }

    /// The equality clauses as one JSON object, for containment queries
    pub fn as_containment(&self) -> Value {
        Value::Object(self.equals.iter().cloned().collect())
    }
}

/// Errors raised by document store adapters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("Document {collection}/{id} was modified concurrently")]
    Conflict { collection: String, id: String },

    #[error("Document {collection}/{id} already exists")]
    AlreadyExists { collection: String, id: String },
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn conflict(collection: &str, id: &str) -> Self {
        Self::Conflict {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn already_exists(collection: &str, id: &str) -> Self {
        Self::AlreadyExists {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Read/query/create/replace access to named document collections
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` if it does not exist
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Documents in `collection` matching `filter`
    async fn query(&self, collection: &str, filter: &QueryFilter)
        -> Result<Vec<Document>, StoreError>;

    /// Insert a new document at version 1; fails with `AlreadyExists` if the id is taken
    async fn create(&self, collection: &str, id: &str, body: Value)
        -> Result<Document, StoreError>;

    /// Overwrite an existing document's body.
    ///
    /// With `expected_version` set, the write only happens if the stored
    /// version still matches, otherwise `Conflict` is returned.
    async fn replace(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        expected_version: Option<i64>,
    ) -> Result<Document, StoreError>;
}
