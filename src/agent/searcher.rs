//! Searcher stage: find vocabulary for a topic and level.

use super::llm::{ChatModel, ChatTurn};
use crate::config::{Prompts, SearcherSettings};
use crate::corpus::parse_pairs;
use crate::error::Result;
use crate::retrieval::{format_entries_for_prompt, RetrievedEntry, VocabularyRetriever};
use crate::search::{format_snippets_for_prompt, WebSearch, WebSnippet};
use crate::story::{dedupe_vocabulary, GenerationRequest, VocabularyEntry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Vocabulary found for one request, with where it came from.
#[derive(Debug, Clone, Default)]
pub struct SearcherOutput {
    /// Merged, de-duplicated vocabulary handed to the writer.
    pub vocabulary: Vec<VocabularyEntry>,
    /// Entries that came straight from the vocabulary store.
    pub store_hits: usize,
    /// Whether the web/model supplement ran.
    pub supplemented: bool,
    /// Failures that were tolerated along the way.
    pub warnings: Vec<String>,
}

/// Looks up vocabulary in the store and supplements it when coverage is thin.
pub struct Searcher {
    retriever: VocabularyRetriever,
    web: Option<Arc<dyn WebSearch>>,
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    settings: SearcherSettings,
    max_web_results: usize,
}

impl Searcher {
    pub fn new(
        retriever: VocabularyRetriever,
        web: Option<Arc<dyn WebSearch>>,
        model: Arc<dyn ChatModel>,
        prompts: Prompts,
        settings: SearcherSettings,
    ) -> Self {
        Self {
            retriever,
            web,
            model,
            prompts,
            settings,
            max_web_results: 8,
        }
    }

    /// Set how many web snippets are passed to the model.
    pub fn with_max_web_results(mut self, max: usize) -> Self {
        self.max_web_results = max;
        self
    }

    /// Find vocabulary for the request.
    ///
    /// Never fails: store, web and model errors degrade to fewer (possibly
    /// zero) entries and are reported in [`SearcherOutput::warnings`].
    #[instrument(skip(self), fields(topic = %request.topic, level = %request.level))]
    pub async fn run(&self, request: &GenerationRequest) -> SearcherOutput {
        let mut output = SearcherOutput::default();
        let mut web_warnings = Vec::new();

        let (store_result, early_snippets) = if self.settings.parallel_web_search {
            let (store_result, snippets) = futures::join!(
                self.retriever.search(&request.topic, self.settings.top_k),
                self.web_snippets(request, &mut web_warnings),
            );
            (store_result, Some(snippets))
        } else {
            (self.retriever.search(&request.topic, self.settings.top_k).await, None)
        };

        let store_entries: Vec<RetrievedEntry> = match store_result {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Vocabulary store lookup failed, continuing without it: {}", e);
                output.warnings.push(e.to_string());
                Vec::new()
            }
        };

        let store_vocabulary = dedupe_vocabulary(store_entries.into_iter().map(|r| r.entry));
        output.store_hits = store_vocabulary.len();

        if store_vocabulary.len() >= self.settings.min_entries {
            debug!("Store coverage sufficient ({} entries)", store_vocabulary.len());
            output.vocabulary = self.bounded(store_vocabulary);
            return output;
        }

        info!(
            "Store returned {} entries (< {}), supplementing",
            store_vocabulary.len(),
            self.settings.min_entries
        );
        output.supplemented = true;

        let snippets = match early_snippets {
            Some(snippets) => snippets,
            None => self.web_snippets(request, &mut web_warnings).await,
        };
        output.warnings.append(&mut web_warnings);

        let supplement = match self.compile(request, &store_vocabulary, &snippets).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Vocabulary supplement failed, continuing with store entries: {}", e);
                output.warnings.push(e.to_string());
                Vec::new()
            }
        };

        output.vocabulary = self.bounded(dedupe_vocabulary(
            store_vocabulary.into_iter().chain(supplement),
        ));
        output
    }

    fn bounded(&self, mut entries: Vec<VocabularyEntry>) -> Vec<VocabularyEntry> {
        entries.truncate(self.settings.max_entries);
        entries
    }

    async fn web_snippets(
        &self,
        request: &GenerationRequest,
        warnings: &mut Vec<String>,
    ) -> Vec<WebSnippet> {
        let Some(web) = &self.web else {
            return Vec::new();
        };

        let query = format!("Dutch vocabulary {}", request.topic);
        match web.search(&query, self.max_web_results).await {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!("Web search failed, continuing without it: {}", e);
                warnings.push(e.to_string());
                Vec::new()
            }
        }
    }

    /// Ask the model to compile vocabulary from the store hits and web snippets.
    async fn compile(
        &self,
        request: &GenerationRequest,
        store_vocabulary: &[VocabularyEntry],
        snippets: &[WebSnippet],
    ) -> Result<Vec<VocabularyEntry>> {
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), request.topic.clone());
        vars.insert(
            "level".to_string(),
            format!("{} ({})", request.level, request.level.vocabulary_guidance()),
        );
        vars.insert(
            "store_entries".to_string(),
            format_entries_for_prompt(store_vocabulary),
        );
        vars.insert("web_results".to_string(), format_snippets_for_prompt(snippets));
        vars.insert("count".to_string(), self.settings.max_entries.to_string());

        let turns = vec![
            ChatTurn::system(self.prompts.render_with_custom(&self.prompts.searcher.system, &vars)),
            ChatTurn::user(self.prompts.render_with_custom(&self.prompts.searcher.user, &vars)),
        ];

        let answer = self.model.complete(&turns, false).await?;
        let entries = parse_pairs(&answer);
        debug!("Model compiled {} vocabulary entries", entries.len());
        Ok(entries)
    }
}
