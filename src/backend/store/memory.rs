/**
 * In-Memory Document Store
 *
 * Process-local implementation of [`DocumentStore`]. The server falls back to
 * it when no database is configured, and tests use it to exercise the
 * moderation core without PostgreSQL.
 *
 * Documents are kept in a single map keyed by `(collection, id)`. A
 * monotonically increasing insertion sequence gives a stable creation order
 * even when two documents share a timestamp.
 */

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Document, DocumentStore, QueryFilter, StoreError};

struct StoredDocument {
    document: Document,
    sequence: u64,
}

#[derive(Default)]
struct MemoryInner {
    documents: HashMap<(String, String), StoredDocument>,
    next_sequence: u64,
}

/// Map-backed document store
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`
    pub async fn count(&self, collection: &str) -> usize {
        let inner = self.inner.read().await;
        inner
            .documents
            .keys()
            .filter(|(stored_collection, _)| stored_collection == collection)
            .count()
    }
}

fn key(collection: &str, id: &str) -> (String, String) {
    (collection.to_string(), id.to_string())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .get(&key(collection, id))
            .map(|stored| stored.document.clone()))
    }

    async fn query(
        &self,
        collection: &str,
        filter: &QueryFilter,
    ) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&StoredDocument> = inner
            .documents
            .iter()
            .filter(|((stored_collection, _), _)| stored_collection == collection)
            .map(|(_, stored)| stored)
            .filter(|stored| filter.matches(&stored.document.body))
            .collect();

        if filter.newest_first {
            matching.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        } else {
            matching.sort_by(|a, b| a.sequence.cmp(&b.sequence));
        }

        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .take(limit)
            .map(|stored| stored.document.clone())
            .collect())
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<Document, StoreError> {
        let mut inner = self.inner.write().await;
        let key = key(collection, id);
        if inner.documents.contains_key(&key) {
            return Err(StoreError::already_exists(collection, id));
        }

        let now = Utc::now();
        let document = Document {
            id: id.to_string(),
            version: 1,
            body,
            created_at: now,
            updated_at: now,
        };
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.documents.insert(
            key,
            StoredDocument {
                document: document.clone(),
                sequence,
            },
        );
        Ok(document)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        expected_version: Option<i64>,
    ) -> Result<Document, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .documents
            .get_mut(&key(collection, id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        if let Some(expected) = expected_version {
            if stored.document.version != expected {
                return Err(StoreError::conflict(collection, id));
            }
        }

        stored.document.body = body;
        stored.document.version += 1;
        stored.document.updated_at = Utc::now();
        Ok(stored.document.clone())
    }
}
