//! Story data model and output rendering.

mod format;
mod models;

pub use format::{format_text, join_sentences, render, RenderedOutput};
pub use models::{
    dedupe_vocabulary, GenerationRequest, Level, OutputFormat, StoryResult, VocabularyEntry,
    SENTENCE_COUNT,
};
