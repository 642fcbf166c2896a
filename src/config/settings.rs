//! Configuration settings for Verhaal.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default Postgres connection for the pgvector vocabulary store.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://ai:ai@localhost:5532/ai";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub search: SearchSettings,
    pub searcher: SearcherSettings,
    pub writer: WriterSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for local application data (sqlite store, etc.).
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.verhaal".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Language model settings shared by all stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Chat model identifier. `OPENAI_MODEL` overrides this.
    pub chat_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Timeout for a single model call, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4o".to_string(),
            temperature: 0.7,
            request_timeout_secs: 120,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Vector store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// PostgreSQL with the pgvector extension.
    #[default]
    Pgvector,
    /// Local SQLite file.
    Sqlite,
    /// In-process, not persisted.
    Memory,
}

impl std::str::FromStr for VectorStoreProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pgvector" | "postgres" | "postgresql" => Ok(VectorStoreProvider::Pgvector),
            "sqlite" => Ok(VectorStoreProvider::Sqlite),
            "memory" => Ok(VectorStoreProvider::Memory),
            _ => Err(format!("Unknown vector store provider: {}", s)),
        }
    }
}

impl std::fmt::Display for VectorStoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorStoreProvider::Pgvector => write!(f, "pgvector"),
            VectorStoreProvider::Sqlite => write!(f, "sqlite"),
            VectorStoreProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Backend to use.
    pub provider: VectorStoreProvider,
    /// Postgres connection URL. `DATABASE_URL` overrides this.
    pub database_url: String,
    /// Table holding vocabulary rows.
    pub table: String,
    /// Maximum pooled Postgres connections.
    pub max_connections: u32,
    /// Path to SQLite database (for the sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Pgvector,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            table: "dutch_vocabulary".to_string(),
            max_connections: 5,
            sqlite_path: "~/.verhaal/vocabulary.db".to_string(),
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Allow supplementing the vocabulary store with web results.
    pub enabled: bool,
    /// DuckDuckGo API base URL.
    pub base_url: String,
    /// Maximum snippets passed on to the model.
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.duckduckgo.com".to_string(),
            max_results: 8,
        }
    }
}

/// Searcher stage tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearcherSettings {
    /// Number of store entries requested per query.
    pub top_k: usize,
    /// Minimum similarity for a store entry to count.
    pub min_score: f32,
    /// Store hits below this count trigger a web supplement.
    pub min_entries: usize,
    /// Upper bound on vocabulary handed to the writer.
    pub max_entries: usize,
    /// Run the web search alongside the store lookup instead of after it.
    pub parallel_web_search: bool,
}

impl Default for SearcherSettings {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_score: 0.3,
            min_entries: 5,
            max_entries: 10,
            parallel_web_search: false,
        }
    }
}

/// Writer stage tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    /// Corrective retries after a malformed answer.
    pub max_retries: u32,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self { max_retries: 1 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Whole-request timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: 120,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply `OPENAI_MODEL` and `DATABASE_URL` overrides.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.model.chat_model = model.trim().to_string();
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            self.vector_store.database_url = url.trim().to_string();
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("verhaal")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }
}
