//! Text-level vocabulary lookup: embed a topic, then query the vector store.

use crate::embedding::Embedder;
use crate::error::{Result, VerhaalError};
use crate::story::VocabularyEntry;
use crate::vector_store::{SearchResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// A vocabulary entry with the similarity score that ranked it.
#[derive(Debug, Clone)]
pub struct RetrievedEntry {
    pub entry: VocabularyEntry,
    pub score: f32,
}

impl From<SearchResult> for RetrievedEntry {
    fn from(result: SearchResult) -> Self {
        Self {
            entry: result.document.entry,
            score: result.score,
        }
    }
}

/// Semantic search over the vocabulary store.
pub struct VocabularyRetriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    min_score: f32,
}

impl VocabularyRetriever {
    /// Create a new retriever.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            min_score: 0.3,
        }
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Return up to `top_k` entries ranked by similarity to `query`.
    ///
    /// Any embedding or store failure is reported as a retrieval error.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedEntry>> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| VerhaalError::Retrieval(format!("embedding query failed: {}", e)))?;

        let results = self
            .vector_store
            .search_with_threshold(&query_embedding, top_k, self.min_score)
            .await
            .map_err(|e| VerhaalError::Retrieval(format!("vocabulary store query failed: {}", e)))?;

        debug!("Retrieved {} vocabulary entries", results.len());
        Ok(results.into_iter().map(RetrievedEntry::from).collect())
    }
}

/// Format entries as `dutch: english` lines for a prompt.
pub fn format_entries_for_prompt(entries: &[VocabularyEntry]) -> String {
    if entries.is_empty() {
        return "(none)".to_string();
    }
    entries
        .iter()
        .map(|e| format!("- {}: {}", e.dutch, e.english))
        .collect::<Vec<_>>()
        .join("\n")
}
