//! Vector store abstraction for the vocabulary corpus.
//!
//! Provides a trait-based interface for different vector database backends.

mod memory;
mod postgres;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use postgres::PgVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::{Settings, VectorStoreProvider};
use crate::error::Result;
use crate::story::VocabularyEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A vocabulary entry stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyDocument {
    /// Unique document ID.
    pub id: Uuid,
    /// The word pair.
    pub entry: VocabularyEntry,
    /// Where the pair came from (word list name).
    pub source: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl VocabularyDocument {
    /// Create a new document.
    pub fn new(entry: VocabularyEntry, source: String, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            entry,
            source,
            embedding,
            indexed_at: Utc::now(),
        }
    }

    /// Text that gets embedded for this entry.
    pub fn embedding_text(entry: &VocabularyEntry) -> String {
        format!("{}: {}", entry.dutch, entry.english)
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: VocabularyDocument,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
///
/// Documents are keyed by their case-folded Dutch word; upserting an existing
/// word replaces it.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk upsert documents.
    async fn upsert_batch(&self, docs: &[VocabularyDocument]) -> Result<usize>;

    /// Search for similar documents.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN).await
    }

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Get total document count.
    async fn entry_count(&self) -> Result<usize>;

    /// Delete every document, returning how many were removed.
    async fn clear(&self) -> Result<usize>;
}

/// Open the vector store selected in the settings.
pub async fn open_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match settings.vector_store.provider {
        VectorStoreProvider::Pgvector => Arc::new(
            PgVectorStore::connect(
                &settings.vector_store.database_url,
                &settings.vector_store.table,
                settings.embedding.dimensions as usize,
                settings.vector_store.max_connections,
            )
            .await?,
        ),
        VectorStoreProvider::Sqlite => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
        VectorStoreProvider::Memory => Arc::new(MemoryVectorStore::new()),
    };
    Ok(store)
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Rank scored documents highest first and keep the best `limit`.
pub(crate) fn rank_results(mut results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}
