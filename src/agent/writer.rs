//! Writer stage: turn a topic, level and vocabulary into five aligned sentence pairs.

use super::llm::{truncate, ChatModel, ChatTurn};
use crate::config::Prompts;
use crate::error::{Result, VerhaalError};
use crate::retrieval::format_entries_for_prompt;
use crate::story::{GenerationRequest, VocabularyEntry, SENTENCE_COUNT};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Five Dutch sentences and their English translations, not yet assembled
/// into a result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Draft {
    pub dutch_sentences: Vec<String>,
    pub english_translations: Vec<String>,
}

/// Asks the chat model for a story and checks the shape of its answer.
pub struct Writer {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    max_retries: u32,
}

impl Writer {
    pub fn new(model: Arc<dyn ChatModel>, prompts: Prompts) -> Self {
        Self {
            model,
            prompts,
            max_retries: 1,
        }
    }

    /// Set how many corrective retries follow a malformed answer.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Write a five-sentence story.
    ///
    /// Fails with [`VerhaalError::Generation`] when the model is unreachable
    /// or still answers with the wrong shape after the retries.
    #[instrument(skip(self, vocabulary), fields(topic = %request.topic, vocabulary = vocabulary.len()))]
    pub async fn write(
        &self,
        request: &GenerationRequest,
        vocabulary: &[VocabularyEntry],
    ) -> Result<Draft> {
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), request.topic.clone());
        vars.insert("level".to_string(), request.level.to_string());
        vars.insert(
            "grammar".to_string(),
            request.level.grammar_guidance().to_string(),
        );
        vars.insert("vocabulary".to_string(), format_entries_for_prompt(vocabulary));

        let mut turns = vec![
            ChatTurn::system(self.prompts.render_with_custom(&self.prompts.writer.system, &vars)),
            ChatTurn::user(self.prompts.render_with_custom(&self.prompts.writer.user, &vars)),
        ];

        let mut attempt = 0;
        loop {
            let answer = self
                .model
                .complete(&turns, true)
                .await
                .map_err(|e| VerhaalError::Generation(format!("model call failed: {}", e)))?;

            let problem = match parse_draft(&answer) {
                Ok(draft) => {
                    debug!("Writer produced a valid draft on attempt {}", attempt + 1);
                    return Ok(draft);
                }
                Err(problem) => problem,
            };

            if attempt >= self.max_retries {
                return Err(VerhaalError::Generation(format!(
                    "unusable story after {} attempt(s): {}",
                    attempt + 1,
                    problem
                )));
            }

            warn!(
                "Writer answer rejected ({}), retrying: {}",
                problem,
                truncate(&answer, 200)
            );
            let mut correction_vars = HashMap::new();
            correction_vars.insert("problem".to_string(), problem);
            turns.push(ChatTurn::assistant(answer));
            turns.push(ChatTurn::user(
                self.prompts
                    .render_with_custom(&self.prompts.writer.correction, &correction_vars),
            ));
            attempt += 1;
        }
    }
}

/// Extract and check a draft. The error is a short description of what was wrong,
/// fed back to the model in the corrective turn.
pub fn parse_draft(answer: &str) -> std::result::Result<Draft, String> {
    let json = extract_json_object(answer).ok_or("no JSON object found")?;
    let draft: Draft =
        serde_json::from_str(json).map_err(|e| format!("malformed JSON: {}", e))?;

    let draft = Draft {
        dutch_sentences: draft.dutch_sentences.iter().map(|s| clean_sentence(s)).collect(),
        english_translations: draft
            .english_translations
            .iter()
            .map(|s| clean_sentence(s))
            .collect(),
    };

    for (name, sentences) in [
        ("dutch_sentences", &draft.dutch_sentences),
        ("english_translations", &draft.english_translations),
    ] {
        if sentences.len() != SENTENCE_COUNT {
            return Err(format!(
                "\"{}\" has {} entries, expected {}",
                name,
                sentences.len(),
                SENTENCE_COUNT
            ));
        }
        if sentences.iter().any(|s| s.is_empty()) {
            return Err(format!("\"{}\" contains an empty sentence", name));
        }
    }

    Ok(draft)
}

/// The span from the first `{` to the last `}`, which skips code fences and prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Trim and drop a single closing period. An ellipsis is kept as written.
fn clean_sentence(s: &str) -> String {
    let s = s.trim();
    match s.strip_suffix('.') {
        Some(rest) if !rest.ends_with('.') => rest.trim_end().to_string(),
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::test_support::ScriptedModel;
    use crate::agent::llm::Role;
    use crate::story::Level;

    const GOOD: &str = r#"{
        "dutch_sentences": ["Het is zaterdag.", "Tom gaat naar de wedstrijd", "Hij ziet de bal", "De keeper springt", "Iedereen juicht"],
        "english_translations": ["It is Saturday.", "Tom goes to the match", "He sees the ball", "The goalkeeper jumps", "Everyone cheers"]
    }"#;

    const FOUR: &str = r#"{"dutch_sentences": ["a", "b", "c", "d"], "english_translations": ["a", "b", "c", "d"]}"#;

    fn request() -> GenerationRequest {
        GenerationRequest {
            topic: "football match".to_string(),
            level: Level::Beginner,
        }
    }

    #[test]
    fn test_parse_draft_strips_one_trailing_period() {
        let draft = parse_draft(GOOD).unwrap();
        assert_eq!(draft.dutch_sentences[0], "Het is zaterdag");
        assert_eq!(draft.english_translations[0], "It is Saturday");
        assert_eq!(draft.dutch_sentences[4], "Iedereen juicht");
    }

    #[test]
    fn test_parse_draft_keeps_other_punctuation() {
        let answer = r#"{"dutch_sentences": ["Wat?", "Ja!", "Nee...", "Oké", "Klaar."],
                          "english_translations": ["What?", "Yes!", "No...", "Okay", "Done."]}"#;
        let draft = parse_draft(answer).unwrap();
        assert_eq!(draft.dutch_sentences[0], "Wat?");
        assert_eq!(draft.dutch_sentences[2], "Nee...");
        assert_eq!(draft.english_translations[2], "No...");
        assert_eq!(draft.dutch_sentences[4], "Klaar");
    }

    #[test]
    fn test_parse_draft_from_fenced_answer() {
        let answer = format!("Here you go:\n```json\n{}\n```", GOOD);
        assert!(parse_draft(&answer).is_ok());
    }

    #[test]
    fn test_parse_draft_reports_problem() {
        assert_eq!(parse_draft("no json here").unwrap_err(), "no JSON object found");
        assert!(parse_draft(FOUR).unwrap_err().contains("has 4 entries"));
        assert!(parse_draft("{\"dutch_sentences\": 3}")
            .unwrap_err()
            .starts_with("malformed JSON"));

        let blank = GOOD.replace("Iedereen juicht", " ");
        assert!(parse_draft(&blank).unwrap_err().contains("empty sentence"));
    }

    #[tokio::test]
    async fn test_write_sends_vocabulary_and_level() {
        let model = Arc::new(ScriptedModel::replying(&[GOOD]));
        let writer = Writer::new(model.clone(), Prompts::default());

        let draft = writer
            .write(&request(), &[VocabularyEntry::new("de bal", "the ball")])
            .await
            .unwrap();

        assert_eq!(draft.dutch_sentences.len(), 5);
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0][0].role, Role::System);
        let user = &seen[0][1].content;
        assert!(user.contains("football match"));
        assert!(user.contains("beginner"));
        assert!(user.contains("- de bal: the ball"));
    }

    #[tokio::test]
    async fn test_write_without_vocabulary() {
        let model = Arc::new(ScriptedModel::replying(&[GOOD]));
        let writer = Writer::new(model.clone(), Prompts::default());

        writer.write(&request(), &[]).await.unwrap();
        assert!(model.seen.lock().unwrap()[0][1].content.contains("(none)"));
    }

    #[tokio::test]
    async fn test_write_retries_on_wrong_count() {
        let model = Arc::new(ScriptedModel::replying(&[FOUR, GOOD]));
        let writer = Writer::new(model.clone(), Prompts::default());

        let draft = writer.write(&request(), &[]).await.unwrap();
        assert_eq!(draft.english_translations[1], "Tom goes to the match");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let retry = &seen[1];
        assert_eq!(retry.len(), 4);
        assert_eq!(retry[2].role, Role::Assistant);
        assert_eq!(retry[2].content, FOUR);
        assert!(retry[3].content.contains("has 4 entries"));
    }

    #[tokio::test]
    async fn test_write_fails_after_retries() {
        let model = Arc::new(ScriptedModel::replying(&[FOUR, FOUR]));
        let writer = Writer::new(model.clone(), Prompts::default());

        let err = writer.write(&request(), &[]).await.unwrap_err();
        assert!(matches!(err, VerhaalError::Generation(_)));
        assert!(err.to_string().contains("2 attempt(s)"));
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_write_without_retries() {
        let model = Arc::new(ScriptedModel::replying(&[FOUR, GOOD]));
        let writer = Writer::new(model.clone(), Prompts::default()).with_max_retries(0);

        assert!(writer.write(&request(), &[]).await.is_err());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_model_failure_is_generation_error() {
        let model = Arc::new(ScriptedModel::new(vec![Err(VerhaalError::OpenAI(
            "401 Unauthorized".to_string(),
        ))]));
        let writer = Writer::new(model, Prompts::default());

        let err = writer.write(&request(), &[]).await.unwrap_err();
        assert!(matches!(err, VerhaalError::Generation(_)));
        assert!(err.to_string().contains("401"));
    }
}
