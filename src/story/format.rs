//! Rendering of a [`StoryResult`] as labeled text or JSON.

use super::{OutputFormat, StoryResult};
use crate::error::Result;

/// A rendered response body with its content type.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedOutput {
    pub format: OutputFormat,
    pub body: String,
}

impl RenderedOutput {
    pub fn content_type(&self) -> &'static str {
        match self.format {
            OutputFormat::Text => "text/plain; charset=utf-8",
            OutputFormat::Json => "application/json",
        }
    }
}

/// Render a story in the requested format.
pub fn render(story: &StoryResult, format: OutputFormat) -> Result<RenderedOutput> {
    let body = match format {
        OutputFormat::Text => format_text(story),
        OutputFormat::Json => serde_json::to_string_pretty(story)?,
    };
    Ok(RenderedOutput { format, body })
}

/// Human-readable block with paragraph, translation and vocabulary sections.
pub fn format_text(story: &StoryResult) -> String {
    let mut output = String::from("**Dutch Paragraph (5 sentences):**\n");
    output.push_str(&join_sentences(story.dutch_sentences()));
    output.push_str("\n\n**English Translation:**\n");
    output.push_str(&join_sentences(story.english_translations()));
    output.push_str("\n\n**Key Vocabulary:**\n");

    if story.vocabulary().is_empty() {
        output.push_str("- (none)\n");
    }
    for word in story.vocabulary() {
        output.push_str(&format!("- {}: {}\n", word.dutch, word.english));
    }

    output
}

/// Join sentences into a paragraph, adding a period where punctuation is missing.
pub fn join_sentences(sentences: &[String]) -> String {
    sentences
        .iter()
        .map(|s| {
            let s = s.trim();
            if s.ends_with(['.', '!', '?']) {
                s.to_string()
            } else {
                format!("{}.", s)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
