//! Ingest command implementation: load a word list into the vocabulary store.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::corpus::load_word_list;
use crate::orchestrator::Orchestrator;
use anyhow::{Context, Result};
use std::path::Path;

/// Entries embedded and written per store round trip.
const INGEST_BATCH: usize = 100;

/// Run the ingest command.
pub async fn run_ingest(
    file: &str,
    recreate: bool,
    source: Option<String>,
    settings: Settings,
) -> Result<()> {
    let path = Settings::expand_path(file);
    let parsed = load_word_list(&path)
        .with_context(|| format!("Failed to read word list {}", path.display()))?;

    if !parsed.skipped_lines.is_empty() {
        Output::warning(&format!(
            "Skipped {} lines without a dutch/english pair (first: line {})",
            parsed.skipped_lines.len(),
            parsed.skipped_lines[0]
        ));
    }
    if parsed.duplicates > 0 {
        Output::info(&format!("Dropped {} duplicate entries", parsed.duplicates));
    }
    if parsed.entries.is_empty() {
        Output::warning("No vocabulary entries found; nothing to ingest.");
        return Ok(());
    }

    preflight::check(Operation::Index, &settings)?;

    let source = source.unwrap_or_else(|| source_name(&path));
    let orchestrator = Orchestrator::new(&settings).await?;

    if recreate {
        let removed = orchestrator.clear_vocabulary().await?;
        Output::info(&format!("Removed {} existing entries", removed));
    }

    let pb = Output::progress_bar(parsed.entries.len() as u64, "Embedding vocabulary");
    let mut indexed = 0;
    for batch in parsed.entries.chunks(INGEST_BATCH) {
        match orchestrator.index_vocabulary(batch, &source).await {
            Ok(n) => {
                indexed += n;
                pb.inc(batch.len() as u64);
            }
            Err(e) => {
                pb.abandon();
                Output::error(&format!("Ingest stopped after {} entries: {}", indexed, e));
                return Err(e.into());
            }
        }
    }
    pb.finish_and_clear();

    let total = orchestrator.vector_store().entry_count().await?;
    Output::success(&format!(
        "Indexed {} entries from '{}' ({} in store)",
        indexed, source, total
    ));

    Ok(())
}

/// Default source label: the file name without its extension.
fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "word-list".to_string())
}
