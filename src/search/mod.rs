//! Web search used to supplement the vocabulary store.

mod duckduckgo;

pub use duckduckgo::DuckDuckGoSearch;

use crate::error::Result;
use async_trait::async_trait;

/// One text snippet returned by a web search.
#[derive(Debug, Clone, PartialEq)]
pub struct WebSnippet {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Abstraction over an external web search tool.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Search for `query`, returning at most `limit` snippets.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebSnippet>>;
}

/// Format snippets as a numbered list for a prompt.
pub fn format_snippets_for_prompt(snippets: &[WebSnippet]) -> String {
    if snippets.is_empty() {
        return "(none)".to_string();
    }
    snippets
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if s.title.is_empty() {
                format!("[{}] {}", i + 1, s.text)
            } else {
                format!("[{}] {}: {}", i + 1, s.title, s.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_snippets() {
        assert_eq!(format_snippets_for_prompt(&[]), "(none)");

        let snippets = vec![
            WebSnippet {
                title: "Voetbal".to_string(),
                text: "Voetbal is een balsport".to_string(),
                url: "https://nl.example.org/voetbal".to_string(),
            },
            WebSnippet {
                title: String::new(),
                text: "de scheidsrechter - the referee".to_string(),
                url: String::new(),
            },
        ];
        assert_eq!(
            format_snippets_for_prompt(&snippets),
            "[1] Voetbal: Voetbal is een balsport\n[2] de scheidsrechter - the referee"
        );
    }
}
