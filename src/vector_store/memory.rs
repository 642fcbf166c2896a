//! In-memory vector store implementation.
//!
//! Useful for testing and small word lists.

use super::{cosine_similarity, rank_results, SearchResult, VectorStore, VocabularyDocument};
use crate::error::{Result, VerhaalError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store keyed by case-folded Dutch word.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<String, VocabularyDocument>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> VerhaalError {
    VerhaalError::VectorStore(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, docs: &[VocabularyDocument]) -> Result<usize> {
        let mut store = self.documents.write().map_err(poisoned)?;
        for doc in docs {
            store.insert(doc.entry.key(), doc.clone());
        }
        Ok(docs.len())
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().map_err(poisoned)?;

        let results: Vec<SearchResult> = docs
            .values()
            .map(|doc| SearchResult {
                document: doc.clone(),
                score: cosine_similarity(query_embedding, &doc.embedding),
            })
            .filter(|r| r.score >= min_score)
            .collect();

        Ok(rank_results(results, limit))
    }

    async fn entry_count(&self) -> Result<usize> {
        let docs = self.documents.read().map_err(poisoned)?;
        Ok(docs.len())
    }

    async fn clear(&self) -> Result<usize> {
        let mut docs = self.documents.write().map_err(poisoned)?;
        let removed = docs.len();
        docs.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::VocabularyEntry;

    fn doc(dutch: &str, english: &str, embedding: Vec<f32>) -> VocabularyDocument {
        VocabularyDocument::new(
            VocabularyEntry::new(dutch, english),
            "test".to_string(),
            embedding,
        )
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store
            .upsert_batch(&[
                doc("de bal", "the ball", vec![1.0, 0.0, 0.0]),
                doc("het veld", "the field", vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.entry_count().await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.entry.dutch, "de bal");
        assert!(results[0].score > results[1].score);

        let results = store.search_with_threshold(&[1.0, 0.0, 0.0], 10, 0.5).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_word() {
        let store = MemoryVectorStore::new();
        store.upsert_batch(&[doc("De Bal", "ball", vec![1.0])]).await.unwrap();
        store.upsert_batch(&[doc("de bal", "the ball", vec![1.0])]).await.unwrap();

        assert_eq!(store.entry_count().await.unwrap(), 1);
        let results = store.search(&[1.0], 1).await.unwrap();
        assert_eq!(results[0].document.entry.english, "the ball");

        assert_eq!(store.clear().await.unwrap(), 1);
        assert_eq!(store.entry_count().await.unwrap(), 0);
    }
}
