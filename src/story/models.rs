//! Core data types: vocabulary entries, levels, requests and validated results.

use crate::error::{Result, VerhaalError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Number of sentences in every generated paragraph (and its translation).
pub const SENTENCE_COUNT: usize = 5;

/// A Dutch word with its English translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub dutch: String,
    pub english: String,
}

impl VocabularyEntry {
    pub fn new(dutch: impl Into<String>, english: impl Into<String>) -> Self {
        Self {
            dutch: dutch.into(),
            english: english.into(),
        }
    }

    /// Case-folded Dutch word, used for de-duplication.
    pub fn key(&self) -> String {
        self.dutch.trim().to_lowercase()
    }
}

/// Remove entries whose Dutch word (case-insensitive) was already seen.
/// The first occurrence wins and order is preserved.
pub fn dedupe_vocabulary(entries: impl IntoIterator<Item = VocabularyEntry>) -> Vec<VocabularyEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| !e.dutch.trim().is_empty() && seen.insert(e.key()))
        .collect()
}

/// Learner proficiency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    /// Grammar guidance handed to the writer.
    pub fn grammar_guidance(&self) -> &'static str {
        match self {
            Level::Beginner => "simple present tense, basic sentence structure",
            Level::Intermediate => "some past tense, compound sentences",
            Level::Advanced => "more complex grammar, idiomatic expressions",
        }
    }

    /// Vocabulary guidance handed to the searcher.
    pub fn vocabulary_guidance(&self) -> &'static str {
        match self {
            Level::Beginner => "basic, everyday words",
            Level::Intermediate => "some more specific terminology",
            Level::Advanced => "idiomatic expressions and specialized vocabulary",
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "beginning" | "novice" | "starter" | "basic" | "a1" | "a2" => Ok(Level::Beginner),
            "intermediate" | "b1" | "b2" => Ok(Level::Intermediate),
            "advanced" | "expert" | "fluent" | "c1" | "c2" => Ok(Level::Advanced),
            _ => Err(format!("Unknown level: {}. Use beginner, intermediate or advanced.", s)),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Beginner => write!(f, "beginner"),
            Level::Intermediate => write!(f, "intermediate"),
            Level::Advanced => write!(f, "advanced"),
        }
    }
}

/// Topic and level extracted from one incoming query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub level: Level,
}

/// A validated paragraph with translation and vocabulary.
///
/// Built through [`StoryResult::new`] or deserialized; both paths enforce
/// the five-sentence contract for both languages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedStory")]
pub struct StoryResult {
    dutch_sentences: Vec<String>,
    english_translations: Vec<String>,
    topic: String,
    level: Level,
    vocabulary: Vec<VocabularyEntry>,
}

#[derive(Deserialize)]
struct UncheckedStory {
    dutch_sentences: Vec<String>,
    english_translations: Vec<String>,
    topic: String,
    level: Level,
    #[serde(default)]
    vocabulary: Vec<VocabularyEntry>,
}

impl TryFrom<UncheckedStory> for StoryResult {
    type Error = VerhaalError;

    fn try_from(raw: UncheckedStory) -> Result<Self> {
        let request = GenerationRequest {
            topic: raw.topic,
            level: raw.level,
        };
        Self::new(
            raw.dutch_sentences,
            raw.english_translations,
            &request,
            raw.vocabulary,
        )
    }
}

impl StoryResult {
    /// Assemble and validate a result.
    pub fn new(
        dutch_sentences: Vec<String>,
        english_translations: Vec<String>,
        request: &GenerationRequest,
        vocabulary: Vec<VocabularyEntry>,
    ) -> Result<Self> {
        check_sentences("Dutch", &dutch_sentences)?;
        check_sentences("English", &english_translations)?;

        Ok(Self {
            dutch_sentences,
            english_translations,
            topic: request.topic.clone(),
            level: request.level,
            vocabulary: dedupe_vocabulary(vocabulary),
        })
    }

    pub fn dutch_sentences(&self) -> &[String] {
        &self.dutch_sentences
    }

    pub fn english_translations(&self) -> &[String] {
        &self.english_translations
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Entries that occur in the Dutch paragraph.
    pub fn vocabulary(&self) -> &[VocabularyEntry] {
        &self.vocabulary
    }
}

fn check_sentences(language: &str, sentences: &[String]) -> Result<()> {
    if sentences.len() != SENTENCE_COUNT {
        return Err(VerhaalError::Generation(format!(
            "expected {} {} sentences, got {}",
            SENTENCE_COUNT,
            language,
            sentences.len()
        )));
    }
    if let Some(i) = sentences.iter().position(|s| s.trim().is_empty()) {
        return Err(VerhaalError::Generation(format!(
            "{} sentence {} is empty",
            language,
            i + 1
        )));
    }
    Ok(())
}

/// Response rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json.", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            topic: "football match".to_string(),
            level: Level::Beginner,
        }
    }

    fn sentences(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Zin {}", i)).collect()
    }

    #[test]
    fn test_story_result_requires_five_sentences() {
        assert!(StoryResult::new(sentences(5), sentences(5), &request(), vec![]).is_ok());

        let err = StoryResult::new(sentences(4), sentences(5), &request(), vec![]).unwrap_err();
        assert!(matches!(err, VerhaalError::Generation(_)));

        let err = StoryResult::new(sentences(5), sentences(6), &request(), vec![]).unwrap_err();
        assert!(err.to_string().contains("English"));
    }

    #[test]
    fn test_story_result_rejects_blank_sentence() {
        let mut dutch = sentences(5);
        dutch[2] = "   ".to_string();
        assert!(StoryResult::new(dutch, sentences(5), &request(), vec![]).is_err());
    }

    #[test]
    fn test_story_result_dedupes_vocabulary() {
        let vocab = vec![
            VocabularyEntry::new("Bal", "ball"),
            VocabularyEntry::new("bal", "ball"),
            VocabularyEntry::new("veld", "field"),
        ];
        let result = StoryResult::new(sentences(5), sentences(5), &request(), vocab).unwrap();
        assert_eq!(result.vocabulary().len(), 2);
        assert_eq!(result.vocabulary()[0].dutch, "Bal");
    }

    #[test]
    fn test_deserialize_enforces_sentence_count() {
        let four = serde_json::json!({
            "dutch_sentences": sentences(4),
            "english_translations": sentences(4),
            "topic": "football match",
            "level": "beginner",
            "vocabulary": []
        });
        let err = serde_json::from_value::<StoryResult>(four).unwrap_err();
        assert!(err.to_string().contains("expected 5 Dutch sentences"));

        let five = serde_json::json!({
            "dutch_sentences": sentences(5),
            "english_translations": sentences(5),
            "topic": "football match",
            "level": "beginner"
        });
        let story: StoryResult = serde_json::from_value(five).unwrap();
        assert_eq!(story.topic(), "football match");
        assert!(story.vocabulary().is_empty());
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("Beginner".parse::<Level>().unwrap(), Level::Beginner);
        assert_eq!("b1".parse::<Level>().unwrap(), Level::Intermediate);
        assert_eq!("fluent".parse::<Level>().unwrap(), Level::Advanced);
        assert!("master".parse::<Level>().is_err());
        assert_eq!(Level::Intermediate.to_string(), "intermediate");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&Level::Advanced).unwrap();
        assert_eq!(json, "\"advanced\"");
    }
}
