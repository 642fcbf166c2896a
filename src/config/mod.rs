//! Configuration module for Verhaal.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, SearcherPrompts, WriterPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, ModelSettings, PromptSettings, SearchSettings,
    SearcherSettings, ServerSettings, Settings, VectorStoreProvider, VectorStoreSettings,
    WriterSettings, DEFAULT_DATABASE_URL,
};
