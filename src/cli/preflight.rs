//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials and configuration are usable before a
//! command connects to anything, so a bad setup fails at startup.

use crate::config::{Settings, VectorStoreProvider};
use crate::error::{Result, VerhaalError};
use url::Url;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Story generation needs the API key, the store and (if enabled) web search.
    Generate,
    /// Ingestion and lookup need the API key for embeddings and the store.
    Index,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or a configuration error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_api_key(|key| std::env::var(key).ok())?;
    check_store(settings)?;
    if let Operation::Generate = operation {
        if settings.search.enabled {
            check_http_url("search.base_url", &settings.search.base_url)?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key<F>(lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("OPENAI_API_KEY") {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(VerhaalError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(VerhaalError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

fn check_store(settings: &Settings) -> Result<()> {
    if settings.vector_store.provider != VectorStoreProvider::Pgvector {
        return Ok(());
    }
    let url = Url::parse(&settings.vector_store.database_url).map_err(|e| {
        VerhaalError::Config(format!("DATABASE_URL is not a valid URL: {}", e))
    })?;
    match url.scheme() {
        "postgres" | "postgresql" => Ok(()),
        other => Err(VerhaalError::Config(format!(
            "DATABASE_URL must use the postgresql:// scheme, got {}://",
            other
        ))),
    }
}

fn check_http_url(name: &str, value: &str) -> Result<()> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(_) | Err(_) => Err(VerhaalError::Config(format!(
            "{} must be an http(s) URL, got {:?}",
            name, value
        ))),
    }
}
