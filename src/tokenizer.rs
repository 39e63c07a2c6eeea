//! Tokenizer - raw text → normalized tokens and stems
//!
//! Lowercases, replaces everything outside `[a-z0-9]` with whitespace,
//! splits, then derives the stop-word-filtered stem sequence used for
//! scoring. The same pipeline runs over catalog phrases so that both sides
//! of a comparison are normalized identically.

use crate::stemmer;
use crate::types::TokenizedMessage;
use regex::Regex;
use std::collections::HashSet;

/// Articles, auxiliary verbs and common pronouns.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "can", "i", "you", "it",
];

/// Single-token negations.
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "dont", "cannot", "cant", "wont", "nothing", "nowhere", "neither", "nor",
];

/// Left halves of `n't` contractions once the apostrophe has been split out
/// ("don't" → "don" "t").
const NEGATED_CONTRACTIONS: &[&str] = &[
    "don", "can", "won", "isn", "aren", "wasn", "weren", "doesn", "didn", "hasn", "haven", "hadn",
    "shouldn", "wouldn", "couldn",
];

/// Tokenizer with a configurable stop-word set
#[derive(Debug, Clone)]
pub struct Tokenizer {
    separators: Regex,
    stop_words: HashSet<String>,
}

impl Tokenizer {
    /// Create a tokenizer with the given stop words.
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            separators: Regex::new(r"[^a-z0-9\s]").expect("separator pattern is valid"),
            stop_words: stop_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Normalize text into tokens.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.separators
            .replace_all(&lowered, " ")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Produce the full tokenized form of a message.
    pub fn tokenize(&self, text: &str) -> TokenizedMessage {
        let tokens = self.normalize(text);
        let stems = tokens
            .iter()
            .filter(|t| !self.is_stop_word(t))
            .map(|t| stemmer::stem(t))
            .collect();

        TokenizedMessage { tokens, stems }
    }

    /// Stems of a catalog phrase, computed exactly like message stems.
    pub fn stems_of(&self, text: &str) -> Vec<String> {
        self.tokenize(text).stems
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    pub fn stop_words(&self) -> impl Iterator<Item = &str> {
        self.stop_words.iter().map(String::as_str)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS.iter().copied())
    }
}

/// Tokenize with the default stop words.
pub fn tokenize(text: &str) -> TokenizedMessage {
    Tokenizer::default().tokenize(text)
}

/// Whether the token sequence contains a negation.
pub fn detect_negation(tokens: &[String]) -> bool {
    tokens.iter().enumerate().any(|(i, token)| {
        NEGATIONS.contains(&token.as_str())
            || (token == "t" && i > 0 && NEGATED_CONTRACTIONS.contains(&tokens[i - 1].as_str()))
    })
}
