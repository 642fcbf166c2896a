//! Free-text query parsing: pull a topic and a proficiency level out of a
//! request like "Tell me a simple story about a football match in Dutch".

use crate::error::{Result, VerhaalError};
use crate::story::{GenerationRequest, Level};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Level words that count on their own. `basic` only counts in a phrase
/// such as "basic-level", since it is a common topic word.
const LEVEL_WORDS: &str = "beginners?|beginning|novices?|starters?|a1|a2|intermediates?|b1|b2|advanced|experts?|fluent|c1|c2";

static LEVEL_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", LEVEL_WORDS)).expect("valid regex")
});

/// "I am an advanced ...", "for beginners", "B1 learners", "basic-level".
static LEVEL_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    let term = format!("basic|{}", LEVEL_WORDS);
    Regex::new(&format!(
        r"(?i)\bi(?:\s+am|'m|’m)\s+(?:(?:an?|at|the|level)\s+)*({t})\b|\bfor\s+(?:(?:an?|the)\s+)?({t})\b|\b({t})[\s-]+(?:learners?|level|students?|speakers?)\b",
        t = term
    ))
    .expect("valid regex")
});

static TOPIC_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:about|on the topic of|regarding|featuring)\s+").expect("valid regex")
});

/// Where a topic stops: " in Dutch", a sentence end, " for" plus a level or
/// learner word, or a comma before "I am" or a level word.
static TOPIC_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\s+in\s+dutch\b|[.!?\n]|\s+for\s+(?:(?:an?|the)\s+)?(?:basic|{w}|learners?|students?)\b|[,;]\s*(?:i(?:\s+am|'m|’m)\b|(?:{w})\b)",
        w = LEVEL_WORDS
    ))
    .expect("valid regex")
});

static REQUEST_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:please\s+)?(?:(?:tell|give|write|create|generate)(?:\s+me)?\s+)?(?:(?:a|an)\s+)?(?:(?:short|simple|little|small|easy)\s+)*(?:(?:dutch|beginner|intermediate|advanced)\s+)*(?:(?:story|paragraph|text)\b)?(?:\s+(?:of|on)\s+)?\s*",
    )
    .expect("valid regex")
});

static LEADING_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:a|an|the)\s+").expect("valid regex"));

/// Parse a query into a generation request.
///
/// The level is read from the text around the topic, so a topic like
/// "an expert chef" does not decide it. It defaults to beginner. A query
/// with no recognizable topic is a validation error.
pub fn parse_query(text: &str) -> Result<GenerationRequest> {
    let text = strip_quotes(text.trim());
    if text.is_empty() {
        return Err(VerhaalError::Validation("query is empty".to_string()));
    }

    let span = topic_span(text);
    let topic = clean_topic(&text[span.clone()]);
    if topic.is_empty() {
        return Err(VerhaalError::Validation(format!(
            "could not find a story topic in {:?}",
            text
        )));
    }

    let around_topic = format!("{} {}", &text[..span.start], &text[span.end..]);
    let level = detect_level(&around_topic);

    Ok(GenerationRequest { topic, level })
}

/// Level named by a learner phrase, else the earliest level word, else beginner.
pub fn detect_level(text: &str) -> Level {
    let from_phrase = LEVEL_PHRASE.captures(text).and_then(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .next()
            .and_then(|m| level_from_word(m.as_str()))
    });

    from_phrase
        .or_else(|| {
            LEVEL_WORD
                .find(text)
                .and_then(|m| level_from_word(m.as_str()))
        })
        .unwrap_or_default()
}

fn level_from_word(word: &str) -> Option<Level> {
    let word = word.to_lowercase();
    word.parse()
        .ok()
        .or_else(|| word.strip_suffix('s').and_then(|w| w.parse().ok()))
}

/// Byte range of the raw topic text, before cleanup.
fn topic_span(text: &str) -> Range<usize> {
    match TOPIC_MARKER.find(text) {
        Some(marker) => marker.end()..marker.end() + topic_end(&text[marker.end()..]),
        None => {
            let end = topic_end(text);
            let start = REQUEST_PREFIX
                .find(&text[..end])
                .map(|m| m.end())
                .unwrap_or(0);
            start..end
        }
    }
}

fn topic_end(text: &str) -> usize {
    TOPIC_END.find(text).map(|m| m.start()).unwrap_or(text.len())
}

fn clean_topic(candidate: &str) -> String {
    let trimmed = candidate
        .trim()
        .trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '"' | '\'' | '“' | '”'))
        .trim();
    LEADING_ARTICLE.replace(trimmed, "").trim().to_string()
}

fn strip_quotes(text: &str) -> &str {
    let quotes: &[char] = &['"', '\'', '“', '”'];
    text.trim_matches(quotes).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_sample() {
        let request = parse_query(
            "Tell me a simple story about a football match in Dutch. I am a beginner learner.",
        )
        .unwrap();
        assert_eq!(request.topic, "football match");
        assert_eq!(request.level, Level::Beginner);
    }

    #[test]
    fn test_level_keywords() {
        let cases = [
            ("A story about cooking for an intermediate learner", Level::Intermediate),
            ("Write about the beach, I'm at B2", Level::Intermediate),
            ("Write about the beach, B1 please", Level::Intermediate),
            ("An advanced story about politics", Level::Advanced),
            ("about trains. I am fluent", Level::Advanced),
            ("about trains, C1 please", Level::Advanced),
            ("about trains, A2", Level::Beginner),
            ("about trains", Level::Beginner),
        ];
        for (query, level) in cases {
            assert_eq!(parse_query(query).unwrap().level, level, "query: {query}");
        }
    }

    #[test]
    fn test_earliest_level_word_wins() {
        let request = parse_query("An intermediate story about an advanced robot").unwrap();
        assert_eq!(request.level, Level::Intermediate);
        assert_eq!(request.topic, "advanced robot");
    }

    #[test]
    fn test_level_after_topic() {
        let request =
            parse_query("Tell me a story about a basic recipe. I am an advanced learner.").unwrap();
        assert_eq!(request.topic, "basic recipe");
        assert_eq!(request.level, Level::Advanced);

        let request = parse_query("Tell me a story about an expert chef. I am a beginner.").unwrap();
        assert_eq!(request.topic, "expert chef");
        assert_eq!(request.level, Level::Beginner);

        let request = parse_query("A story about a starter pack, for C1 students").unwrap();
        assert_eq!(request.topic, "starter pack");
        assert_eq!(request.level, Level::Advanced);
    }

    #[test]
    fn test_plural_level_words() {
        let cases = [
            ("A story about the zoo for beginners", Level::Beginner),
            ("A story about the zoo for intermediates", Level::Intermediate),
            ("A story about the zoo for advanced learners", Level::Advanced),
            ("A story about the zoo for experts", Level::Advanced),
        ];
        for (query, level) in cases {
            let request = parse_query(query).unwrap();
            assert_eq!(request.topic, "zoo", "query: {query}");
            assert_eq!(request.level, level, "query: {query}");
        }
        assert_eq!(detect_level("a basic-level story"), Level::Beginner);
    }

    #[test]
    fn test_for_only_ends_topic_before_a_learner() {
        assert_eq!(
            parse_query("A story about waiting for the bus").unwrap().topic,
            "waiting for the bus"
        );
        assert_eq!(
            parse_query("A story about a gift for my mother in Dutch").unwrap().topic,
            "gift for my mother"
        );
    }

    #[test]
    fn test_level_word_needs_word_boundary() {
        assert_eq!(detect_level("a story about vitamin c12"), Level::Beginner);
        assert_eq!(detect_level("a story about the B1 bus"), Level::Intermediate);
    }

    #[test]
    fn test_topic_markers() {
        let cases = [
            ("Write a story on the topic of the weather", "weather"),
            ("A short paragraph regarding my cat Minoes!", "my cat Minoes"),
            ("A tale featuring an old lighthouse keeper", "old lighthouse keeper"),
            ("Tell me about the market for a beginner", "market"),
            ("Tell me a story about \"de Elfstedentocht\" in Dutch", "de Elfstedentocht"),
        ];
        for (query, topic) in cases {
            assert_eq!(parse_query(query).unwrap().topic, topic, "query: {query}");
        }
    }

    #[test]
    fn test_topic_without_marker() {
        assert_eq!(parse_query("football").unwrap().topic, "football");
        assert_eq!(parse_query("Tell me a story of a rainy day").unwrap().topic, "rainy day");
        assert_eq!(
            parse_query("Write a simple Dutch story. Topic is unclear.").unwrap_err().to_string(),
            "Invalid request: could not find a story topic in \"Write a simple Dutch story. Topic is unclear.\""
        );
        assert_eq!(parse_query("the zoo in Dutch").unwrap().topic, "zoo");
        assert_eq!(parse_query("Write a text on textbooks").unwrap().topic, "textbooks");
    }

    #[test]
    fn test_quoted_query() {
        let request = parse_query("  \"A story about bicycles\"  ").unwrap();
        assert_eq!(request.topic, "bicycles");
    }

    #[test]
    fn test_empty_query_rejected() {
        for query in ["", "   ", "\"\"", "about ."] {
            let err = parse_query(query).unwrap_err();
            assert!(matches!(err, VerhaalError::Validation(_)), "query: {query:?}");
        }
    }
}
