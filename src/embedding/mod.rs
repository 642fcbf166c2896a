//! Embedding generation for vocabulary lookup.
//!
//! Entries and topics are embedded with the same model so that a topic such
//! as "football match" lands near entries like "de wedstrijd: the match".

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::{Result, VerhaalError};
use crate::story::VocabularyEntry;
use crate::vector_store::VocabularyDocument;
use async_trait::async_trait;

/// Turns text into vectors. Implementors only need [`Embedder::embed_batch`].
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed many texts, returning one vector per input in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Length of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VerhaalError::Embedding("Empty embedding response".to_string()))
    }

    /// Embed vocabulary entries in their stored `dutch: english` form.
    async fn embed_entries(&self, entries: &[VocabularyEntry]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = entries.iter().map(VocabularyDocument::embedding_text).collect();
        self.embed_batch(&texts).await
    }
}
