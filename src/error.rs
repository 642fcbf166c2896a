//! Error types for Verhaal.

use thiserror::Error;

/// Library-level error type for Verhaal operations.
#[derive(Error, Debug)]
pub enum VerhaalError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The vocabulary store or the web search could not be used.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// The language model failed or broke the five-sentence contract.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The request itself was unusable (e.g. no topic in the query).
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Web search error: {0}")]
    WebSearch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

impl VerhaalError {
    /// Whether the error originates from an upstream service (model, search, store).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            VerhaalError::Retrieval(_)
                | VerhaalError::Generation(_)
                | VerhaalError::Embedding(_)
                | VerhaalError::VectorStore(_)
                | VerhaalError::WebSearch(_)
                | VerhaalError::Http(_)
                | VerhaalError::Postgres(_)
                | VerhaalError::OpenAI(_)
        )
    }
}

/// Result type alias for Verhaal operations.
pub type Result<T> = std::result::Result<T, VerhaalError>;
