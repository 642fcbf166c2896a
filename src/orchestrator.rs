//! Request coordinator for Verhaal.
//!
//! Sequences one request through the searcher and writer stages, validates
//! the result and renders it. Also owns the indexing path used by `ingest`.

use crate::agent::{ChatModel, OpenAIChat, Searcher, Writer};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::query::parse_query;
use crate::retrieval::VocabularyRetriever;
use crate::search::{DuckDuckGoSearch, WebSearch};
use crate::story::{
    dedupe_vocabulary, render, GenerationRequest, OutputFormat, RenderedOutput, StoryResult,
    VocabularyEntry,
};
use crate::vector_store::{open_store, VectorStore, VocabularyDocument};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Progress of a single request, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitingSearch,
    AwaitingWrite,
    Validating,
    Done,
    Failed,
}

/// The main orchestrator for the Verhaal pipeline.
pub struct Orchestrator {
    searcher: Searcher,
    writer: Writer,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl Orchestrator {
    /// Build every component from the settings.
    ///
    /// Connects to the vector store, so this fails when the store is unreachable.
    pub async fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let model: Arc<dyn ChatModel> = Arc::new(OpenAIChat::from_settings(&settings.model)?);
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let vector_store = open_store(settings).await?;

        let web: Option<Arc<dyn WebSearch>> = if settings.search.enabled {
            Some(Arc::new(DuckDuckGoSearch::from_settings(&settings.search)?))
        } else {
            info!("Web search disabled; using the vocabulary store only");
            None
        };

        info!(
            "Using {} with {} vector store",
            settings.model.chat_model, settings.vector_store.provider
        );

        Ok(Self::with_components(
            settings,
            prompts,
            model,
            embedder,
            vector_store,
            web,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: &Settings,
        prompts: Prompts,
        model: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        web: Option<Arc<dyn WebSearch>>,
    ) -> Self {
        let retriever = VocabularyRetriever::new(vector_store.clone(), embedder.clone())
            .with_min_score(settings.searcher.min_score);
        let searcher = Searcher::new(
            retriever,
            web,
            model.clone(),
            prompts.clone(),
            settings.searcher.clone(),
        )
        .with_max_web_results(settings.search.max_results);
        let writer = Writer::new(model, prompts).with_max_retries(settings.writer.max_retries);

        Self {
            searcher,
            writer,
            embedder,
            vector_store,
        }
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Parse a free-text query and generate a story for it.
    pub async fn generate(&self, query: &str) -> Result<StoryResult> {
        let request = parse_query(query)?;
        self.generate_request(&request).await
    }

    /// Parse, generate and render in one step.
    pub async fn generate_formatted(
        &self,
        query: &str,
        format: OutputFormat,
    ) -> Result<RenderedOutput> {
        let story = self.generate(query).await?;
        render(&story, format)
    }

    /// Run the searcher and writer for an already-parsed request.
    #[instrument(skip(self), fields(topic = %request.topic, level = %request.level))]
    pub async fn generate_request(&self, request: &GenerationRequest) -> Result<StoryResult> {
        let mut stage = Stage::AwaitingSearch;
        debug!("Stage: {:?}", stage);

        let found = self.searcher.run(request).await;
        if found.vocabulary.is_empty() {
            warn!("No vocabulary found for '{}', writing without it", request.topic);
        }
        info!(
            "Searcher found {} entries ({} from store)",
            found.vocabulary.len(),
            found.store_hits
        );

        stage = advance(stage, Stage::AwaitingWrite);
        let draft = match self.writer.write(request, &found.vocabulary).await {
            Ok(draft) => draft,
            Err(e) => {
                advance(stage, Stage::Failed);
                return Err(e);
            }
        };

        stage = advance(stage, Stage::Validating);
        let vocabulary = select_vocabulary(found.vocabulary, &draft.dutch_sentences);
        let story = match StoryResult::new(
            draft.dutch_sentences,
            draft.english_translations,
            request,
            vocabulary,
        ) {
            Ok(story) => story,
            Err(e) => {
                advance(stage, Stage::Failed);
                return Err(e);
            }
        };

        advance(stage, Stage::Done);
        Ok(story)
    }

    /// Embed and store vocabulary entries under `source`. Returns how many were written.
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    pub async fn index_vocabulary(&self, entries: &[VocabularyEntry], source: &str) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.embed_entries(entries).await?;

        let docs: Vec<VocabularyDocument> = entries
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(entry, embedding)| VocabularyDocument::new(entry, source.to_string(), embedding))
            .collect();

        self.vector_store.upsert_batch(&docs).await
    }

    /// Remove every entry from the vocabulary store.
    pub async fn clear_vocabulary(&self) -> Result<usize> {
        self.vector_store.clear().await
    }
}

fn advance(from: Stage, to: Stage) -> Stage {
    debug!("Stage: {:?} -> {:?}", from, to);
    to
}

/// Keep the entries whose Dutch word occurs as a whole word in the story.
pub fn select_vocabulary(
    vocabulary: Vec<VocabularyEntry>,
    dutch_sentences: &[String],
) -> Vec<VocabularyEntry> {
    let text = dutch_sentences.join(" ");

    dedupe_vocabulary(vocabulary)
        .into_iter()
        .filter(|entry| occurs_as_word(&text, &entry.key()))
        .collect()
}

/// Whole-word, case-insensitive match of `word` in `text`.
fn occurs_as_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let pattern = format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(word));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            warn!("Skipping vocabulary match for {:?}: {}", word, e);
            false
        }
    }
}
