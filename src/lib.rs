//! Verhaal - short Dutch stories for language learners
//!
//! Turns a free-text request such as "Tell me a simple story about a football
//! match in Dutch" into a five-sentence Dutch paragraph, its English
//! translation and the key vocabulary it uses.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `query` - Topic and level extraction from free text
//! - `embedding` - Embedding generation
//! - `vector_store` - Vocabulary store (pgvector, SQLite, in-memory)
//! - `retrieval` - Semantic vocabulary lookup
//! - `search` - Web search (DuckDuckGo)
//! - `corpus` - Word-list parsing
//! - `agent` - Searcher and writer stages
//! - `story` - Result model and rendering
//! - `orchestrator` - Request coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use verhaal::config::Settings;
//! use verhaal::orchestrator::Orchestrator;
//! use verhaal::story::OutputFormat;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings).await?;
//!
//!     let output = orchestrator
//!         .generate_formatted("A simple story about a football match", OutputFormat::Text)
//!         .await?;
//!     println!("{}", output.body);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod query;
pub mod retrieval;
pub mod search;
pub mod story;
pub mod vector_store;

pub use error::{Result, VerhaalError};
