//! Parsing of Dutch/English word lists.
//!
//! The same line format is accepted from vocabulary files on disk and from
//! the searcher model's answers: one pair per line, separated by a tab,
//! `:`, `=`, `;` or a spaced dash.

use crate::error::Result;
use crate::story::{dedupe_vocabulary, VocabularyEntry};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]+|\d+[.)])\s*").expect("valid regex"));

const SEPARATORS: [&str; 7] = ["\t", ":", "=", ";", " - ", " – ", " — "];

/// Result of parsing a word list.
#[derive(Debug, Default)]
pub struct ParsedWordList {
    /// De-duplicated entries in file order.
    pub entries: Vec<VocabularyEntry>,
    /// Line numbers (1-based) that held text but no usable pair.
    pub skipped_lines: Vec<usize>,
    /// Pairs dropped because the Dutch word was already listed.
    pub duplicates: usize,
}

/// Parse one `dutch<sep>english` line. Returns `None` for anything else.
pub fn parse_pair_line(line: &str) -> Option<VocabularyEntry> {
    let line = LIST_MARKER.replace(line, "");
    let line = line.replace("**", "").replace('`', "");
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (dutch, english) = SEPARATORS
        .iter()
        .filter_map(|sep| line.find(sep).map(|pos| (pos, *sep)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(pos, sep)| (&line[..pos], &line[pos + sep.len()..]))?;

    let dutch = clean_side(dutch);
    let english = clean_side(english);
    if dutch.is_empty() || english.is_empty() {
        return None;
    }

    Some(VocabularyEntry::new(dutch, english))
}

fn clean_side(s: &str) -> String {
    s.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '“' || c == '”')
        .trim()
        .to_string()
}

/// Parse every pair from free text (e.g. a model answer), dropping duplicates.
pub fn parse_pairs(text: &str) -> Vec<VocabularyEntry> {
    dedupe_vocabulary(text.lines().filter_map(parse_pair_line))
}

/// Parse a word list, keeping track of lines that could not be used.
pub fn parse_word_list(content: &str) -> ParsedWordList {
    let mut parsed = Vec::new();
    let mut skipped_lines = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_pair_line(line) {
            Some(entry) => parsed.push(entry),
            None => skipped_lines.push(i + 1),
        }
    }

    let total = parsed.len();
    let entries = dedupe_vocabulary(parsed);
    ParsedWordList {
        duplicates: total - entries.len(),
        entries,
        skipped_lines,
    }
}

/// Read and parse a word list file.
pub fn load_word_list(path: &Path) -> Result<ParsedWordList> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_word_list(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair_separators() {
        let cases = [
            ("de bal: the ball", "de bal", "the ball"),
            ("het veld\tthe field", "het veld", "the field"),
            ("de keeper = the goalkeeper", "de keeper", "the goalkeeper"),
            ("scoren - to score", "scoren", "to score"),
            ("juichen; to cheer", "juichen", "to cheer"),
        ];
        for (line, dutch, english) in cases {
            let entry = parse_pair_line(line).unwrap();
            assert_eq!(entry.dutch, dutch, "line: {line}");
            assert_eq!(entry.english, english, "line: {line}");
        }
    }

    #[test]
    fn test_parse_pair_strips_markdown() {
        let entry = parse_pair_line("1. **de scheidsrechter**: the referee").unwrap();
        assert_eq!(entry, VocabularyEntry::new("de scheidsrechter", "the referee"));

        let entry = parse_pair_line("- \"het doelpunt\": \"the goal\"").unwrap();
        assert_eq!(entry, VocabularyEntry::new("het doelpunt", "the goal"));
    }

    #[test]
    fn test_hyphenated_word_is_not_split() {
        let entry = parse_pair_line("e-mail: email").unwrap();
        assert_eq!(entry.dutch, "e-mail");
    }

    #[test]
    fn test_parse_pair_rejects_headers() {
        assert!(parse_pair_line("Vocabulary:").is_none());
        assert!(parse_pair_line("Here are some words").is_none());
        assert!(parse_pair_line("# comment: here").is_none());
        assert!(parse_pair_line("").is_none());
    }

    #[test]
    fn test_parse_pairs_from_model_answer() {
        let answer = "Here is the vocabulary:\n\n- de bal: the ball\n- De Bal: ball\n- het veld: the field\n";
        let entries = parse_pairs(answer);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].dutch, "het veld");
    }

    #[test]
    fn test_parse_word_list_reports_skips_and_duplicates() {
        let content = "# 1000 Dutch words\n\nhuis: house\nnonsense line\nboom\ttree\nHuis: home\n";
        let parsed = parse_word_list(content);
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.skipped_lines, vec![4]);
        assert_eq!(parsed.duplicates, 1);
        assert_eq!(parsed.entries[0].english, "house");
    }

    #[test]
    fn test_load_word_list_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "kat: cat\nhond: dog\n").unwrap();

        let parsed = load_word_list(&path).unwrap();
        assert_eq!(parsed.entries.len(), 2);
    }
}
