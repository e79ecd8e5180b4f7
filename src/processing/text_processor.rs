//! Tokenization shared by indexing and content search

use regex::Regex;
use std::collections::HashSet;

/// Tokens this short or shorter are never indexed.
const MIN_TOKEN_EXCLUSIVE: usize = 2;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "must", "can", "this", "that",
    "these", "those",
];

#[derive(Debug, Clone)]
pub struct TextProcessor {
    stop_words: HashSet<&'static str>,
    non_word_regex: Regex,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        let non_word_regex = Regex::new(r"[^\w\s]").expect("Invalid non-word regex");

        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            non_word_regex,
        }
    }

    /// Lowercase, blank out punctuation, split on whitespace, then drop short
    /// tokens and stop words. Order and duplicates are preserved.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let cleaned = self.non_word_regex.replace_all(&lowered, " ");

        cleaned
            .split_whitespace()
            .filter(|token| token.chars().count() > MIN_TOKEN_EXCLUSIVE)
            .filter(|token| !self.stop_words.contains(*token))
            .map(str::to_string)
            .collect()
    }

    pub fn unique_tokens(&self, text: &str) -> HashSet<String> {
        self.tokenize(text).into_iter().collect()
    }

    /// Whitespace-delimited, non-empty tokens.
    pub fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }
}
