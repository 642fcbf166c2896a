//! Search command implementation: look up stored vocabulary for a topic.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::retrieval::VocabularyRetriever;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    topic: &str,
    limit: usize,
    min_score: Option<f32>,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Index, &settings)?;

    let orchestrator = Orchestrator::new(&settings).await?;
    let retriever = VocabularyRetriever::new(orchestrator.vector_store(), orchestrator.embedder())
        .with_min_score(min_score.unwrap_or(settings.searcher.min_score));

    let spinner = Output::spinner("Searching vocabulary...");
    let results = retriever.search(topic, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) if hits.is_empty() => {
            Output::warning("No stored vocabulary matches this topic.");
        }
        Ok(hits) => {
            Output::success(&format!("Found {} entries", hits.len()));
            for hit in &hits {
                Output::vocabulary_hit(&hit.entry.dutch, &hit.entry.english, hit.score);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
