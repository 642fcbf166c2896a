//! PostgreSQL + pgvector vector store.
//!
//! Similarity is computed by the database with the cosine distance operator
//! (`<=>`); embeddings are sent as pgvector text literals so no extra type
//! support is needed on the client side.

use super::{SearchResult, VectorStore, VocabularyDocument};
use crate::error::{Result, VerhaalError};
use crate::story::VocabularyEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Vector store backed by a pgvector table.
pub struct PgVectorStore {
    pool: PgPool,
    table: String,
    dimensions: usize,
}

impl PgVectorStore {
    /// Connect, then create the extension, table and index if missing.
    #[instrument(skip(database_url))]
    pub async fn connect(
        database_url: &str,
        table: &str,
        dimensions: usize,
        max_connections: u32,
    ) -> Result<Self> {
        validate_table_name(table)?;

        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(|e| VerhaalError::Retrieval(format!("Could not connect to Postgres: {}", e)))?;

        let store = Self {
            pool,
            table: table.to_string(),
            dimensions,
        };
        store.ensure_schema().await?;

        info!("Connected to pgvector store (table {})", store.table);
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id UUID PRIMARY KEY,
                dutch_key TEXT NOT NULL UNIQUE,
                dutch TEXT NOT NULL,
                english TEXT NOT NULL,
                source TEXT NOT NULL,
                embedding vector({dims}) NOT NULL,
                indexed_at TIMESTAMPTZ NOT NULL
            )
            "#,
            table = self.table,
            dims = self.dimensions
        );
        sqlx::query(&create_table).execute(&self.pool).await?;

        let create_index = format!(
            "CREATE INDEX IF NOT EXISTS {table}_embedding_idx ON {table} USING hnsw (embedding vector_cosine_ops)",
            table = self.table
        );
        sqlx::query(&create_index).execute(&self.pool).await?;

        Ok(())
    }
}

/// Only plain identifiers are accepted, since the table name is interpolated into SQL.
fn validate_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table.len() <= 63
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(VerhaalError::Config(format!(
            "Invalid vector store table name: {:?}",
            table
        )))
    }
}

/// Format an embedding as a pgvector literal, e.g. `[0.1,0.2,0.3]`.
fn to_vector_literal(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

#[async_trait]
impl VectorStore for PgVectorStore {
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn upsert_batch(&self, docs: &[VocabularyDocument]) -> Result<usize> {
        if let Some(bad) = docs.iter().find(|d| d.embedding.len() != self.dimensions) {
            return Err(VerhaalError::VectorStore(format!(
                "Embedding for '{}' has {} dimensions, table expects {}",
                bad.entry.dutch,
                bad.embedding.len(),
                self.dimensions
            )));
        }

        let sql = format!(
            r#"
            INSERT INTO {table} (id, dutch_key, dutch, english, source, embedding, indexed_at)
            VALUES ($1, $2, $3, $4, $5, $6::text::vector, $7)
            ON CONFLICT (dutch_key) DO UPDATE SET
                dutch = EXCLUDED.dutch,
                english = EXCLUDED.english,
                source = EXCLUDED.source,
                embedding = EXCLUDED.embedding,
                indexed_at = EXCLUDED.indexed_at
            "#,
            table = self.table
        );

        let mut tx = self.pool.begin().await?;
        for doc in docs {
            sqlx::query(&sql)
                .bind(doc.id)
                .bind(doc.entry.key())
                .bind(&doc.entry.dutch)
                .bind(&doc.entry.english)
                .bind(&doc.source)
                .bind(to_vector_literal(&doc.embedding))
                .bind(doc.indexed_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!("Batch upserted {} vocabulary entries", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let sql = format!(
            r#"
            SELECT id, dutch, english, source, indexed_at,
                   (1 - (embedding <=> $1::text::vector))::float4 AS score
            FROM {table}
            WHERE 1 - (embedding <=> $1::text::vector) >= $2
            ORDER BY embedding <=> $1::text::vector
            LIMIT $3
            "#,
            table = self.table
        );

        let rows = sqlx::query(&sql)
            .bind(to_vector_literal(query_embedding))
            .bind(f64::from(min_score))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let indexed_at: DateTime<Utc> = row.try_get("indexed_at")?;
            results.push(SearchResult {
                document: VocabularyDocument {
                    id: row.try_get::<Uuid, _>("id")?,
                    entry: VocabularyEntry {
                        dutch: row.try_get("dutch")?,
                        english: row.try_get("english")?,
                    },
                    source: row.try_get("source")?,
                    // Not selected; callers only need the entry and score.
                    embedding: Vec::new(),
                    indexed_at,
                },
                score: row.try_get("score")?,
            });
        }

        debug!("Found {} matching entries", results.len());
        Ok(results)
    }

    async fn entry_count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<usize> {
        let sql = format!("DELETE FROM {}", self.table);
        let deleted = sqlx::query(&sql).execute(&self.pool).await?.rows_affected();
        info!("Deleted {} vocabulary entries", deleted);
        Ok(deleted as usize)
    }
}
