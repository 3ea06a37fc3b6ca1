/**
 * PostgreSQL Document Store
 *
 * Persists documents as JSONB rows in the `documents` table created by the
 * migration in `migrations/`. Equality filters are pushed down as a JSONB
 * containment test (`body @> $filter`), and `replace` with an expected
 * version is a single conditional `UPDATE`, so the version check and the
 * write are atomic.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use super::{Document, DocumentStore, QueryFilter, StoreError};

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    version: i64,
    body: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            version: row.version,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// sqlx-backed document store
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, version, body, created_at, updated_at
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }

    async fn query(
        &self,
        collection: &str,
        filter: &QueryFilter,
    ) -> Result<Vec<Document>, StoreError> {
        let order = if filter.newest_first { "DESC" } else { "ASC" };
        let sql = format!(
            r#"
            SELECT id, version, body, created_at, updated_at
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY created_at {order}, id {order}
            LIMIT $3
            "#
        );
        // LIMIT NULL is no limit
        let limit = filter.limit.map(|limit| limit.min(i64::MAX as usize) as i64);

        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(collection)
            .bind(filter.as_containment())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (collection, id, body, version, created_at, updated_at)
            VALUES ($1, $2, $3, 1, NOW(), NOW())
            ON CONFLICT (collection, id) DO NOTHING
            RETURNING id, version, body, created_at, updated_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&body)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Document::from)
            .ok_or_else(|| StoreError::already_exists(collection, id))
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        expected_version: Option<i64>,
    ) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
            SET body = $3, version = version + 1, updated_at = NOW()
            WHERE collection = $1 AND id = $2
              AND ($4::BIGINT IS NULL OR version = $4)
            RETURNING id, version, body, created_at, updated_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&body)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            // Nothing updated: either the row is gone or the version moved on
            None => match self.get(collection, id).await? {
                Some(_) => Err(StoreError::conflict(collection, id)),
                None => Err(StoreError::not_found(collection, id)),
            },
        }
    }
}
