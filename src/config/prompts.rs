//! Prompt templates for the searcher and writer stages.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub searcher: SearcherPrompts,
    pub writer: WriterPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for the vocabulary searcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearcherPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SearcherPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert vocabulary finder for Dutch language learners.
Your task is to compile relevant Dutch vocabulary for a given topic and proficiency level.

- Use the knowledge base entries and web results you are given as your primary sources.
- Fill gaps with common, correct Dutch words for the topic.
- For beginners: focus on basic, everyday words.
  For intermediate: include some more specific terminology.
  For advanced: include idiomatic expressions and specialized vocabulary.

Format each vocabulary word on its own line as: "Dutch word: English translation"
Focus ONLY on listing vocabulary. Do not write stories or explanations."#
                .to_string(),

            user: r#"Topic: {{topic}}
Proficiency level: {{level}}

Knowledge base entries:
{{store_entries}}

Web results:
{{web_results}}

List {{count}} Dutch vocabulary words for this topic and level."#
                .to_string(),
        }
    }
}

/// Prompts for the story writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterPrompts {
    pub system: String,
    pub user: String,
    /// Appended after a malformed answer.
    pub correction: String,
}

impl Default for WriterPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a creative writer specializing in simple Dutch stories for language learners.

Rules:
1. Write a very short story in Dutch about the given topic.
2. The story must be EXACTLY 5 sentences long - no more, no less.
3. Incorporate the provided vocabulary words where they fit naturally.
4. Match the grammar to the proficiency level you are given.
5. Provide an accurate English translation of each sentence, in the same order.
6. Do not define words within the story or add explanations.
7. Do not end sentences with a period; punctuation is added during formatting.

Respond with a JSON object only:
{"dutch_sentences": ["...", "...", "...", "...", "..."], "english_translations": ["...", "...", "...", "...", "..."]}"#
                .to_string(),

            user: r#"Topic: {{topic}}
Proficiency level: {{level}} ({{grammar}})

Vocabulary to use:
{{vocabulary}}"#
                .to_string(),

            correction: r#"Your previous answer was not usable: {{problem}}
Answer again with a JSON object containing exactly 5 "dutch_sentences" and exactly 5 "english_translations"."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let searcher_path = custom_path.join("searcher.toml");
            if searcher_path.exists() {
                let content = std::fs::read_to_string(&searcher_path)?;
                prompts.searcher = toml::from_str(&content)?;
            }

            let writer_path = custom_path.join("writer.toml");
            if writer_path.exists() {
                let content = std::fs::read_to_string(&writer_path)?;
                prompts.writer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.writer.system.contains("EXACTLY 5"));
        assert!(prompts.searcher.system.contains("Dutch word: English translation"));
    }

    #[test]
    fn test_render_template() {
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), "football match".to_string());
        vars.insert("level".to_string(), "beginner".to_string());

        let result = Prompts::render("Topic: {{topic}} ({{level}})", &vars);
        assert_eq!(result, "Topic: football match (beginner)");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("level".to_string(), "advanced".to_string());
        prompts.variables.insert("tone".to_string(), "playful".to_string());

        let mut vars = HashMap::new();
        vars.insert("level".to_string(), "beginner".to_string());

        let result = prompts.render_with_custom("{{level}}, {{tone}}", &vars);
        assert_eq!(result, "beginner, playful");
    }

    #[test]
    fn test_load_custom_writer_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("writer.toml"),
            "system = \"Schrijf een verhaal.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.writer.system, "Schrijf een verhaal.");
        assert!(prompts.writer.user.contains("{{vocabulary}}"));
        assert!(prompts.searcher.system.contains("vocabulary finder"));
    }
}
