//! Intent Flow - Core Data Structures
//!
//! Catalog definitions, tokenized messages and match results.

use serde::{Deserialize, Serialize};

/// Reserved id and label for messages that match no intent well enough.
pub const UNKNOWN_INTENT: &str = "UNKNOWN";

/// One intent as supplied by the catalog file.
///
/// Strings are expected to be lowercase, trimmed and deduplicated; the
/// catalog loader enforces this before scoring sees a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentDefinition {
    pub id: String,
    pub label: String,
    pub phrases: Vec<String>,

    #[serde(default)]
    pub strong_tokens: Vec<String>,

    #[serde(default)]
    pub weak_tokens: Vec<String>,

    /// Acceptance threshold override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,

    /// Score multiplier
    #[serde(default = "default_priority")]
    pub priority: f32,

    /// Whether a negated message suppresses this intent
    #[serde(default = "default_can_be_negated")]
    pub can_be_negated: bool,
}

fn default_priority() -> f32 {
    1.0
}

fn default_can_be_negated() -> bool {
    true
}

impl IntentDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            phrases: Vec::new(),
            strong_tokens: Vec::new(),
            weak_tokens: Vec::new(),
            min_score: None,
            priority: default_priority(),
            can_be_negated: default_can_be_negated(),
        }
    }

    pub fn phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phrases = phrases.into_iter().map(Into::into).collect();
        self
    }

    pub fn strong_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strong_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn weak_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.weak_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn priority(mut self, priority: f32) -> Self {
        self.priority = priority;
        self
    }

    pub fn can_be_negated(mut self, can_be_negated: bool) -> Self {
        self.can_be_negated = can_be_negated;
        self
    }
}

/// A message after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedMessage {
    /// Every normalized word, in order
    pub tokens: Vec<String>,

    /// Stop words removed, remaining words stemmed
    pub stems: Vec<String>,
}

/// Outcome of classifying one message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub intent_id: String,
    pub label: String,
    pub score: f32,

    /// Phrase responsible for the dominant score, `None` when no phrase hit
    pub matched_phrase: Option<String>,

    pub strong_tokens: Vec<String>,
    pub weak_tokens: Vec<String>,
    pub fuzzy_tokens: Vec<String>,

    /// Score as a percentage of the intent's best attainable score (0-100)
    pub confidence: f32,

    /// Whether the message contained a negation
    pub negated: bool,
}

impl MatchResult {
    /// The UNKNOWN classification, carrying the insufficient best score.
    pub fn unknown(score: f32, negated: bool) -> Self {
        Self {
            intent_id: UNKNOWN_INTENT.to_string(),
            label: UNKNOWN_INTENT.to_string(),
            score,
            matched_phrase: None,
            strong_tokens: Vec::new(),
            weak_tokens: Vec::new(),
            fuzzy_tokens: Vec::new(),
            confidence: 0.0,
            negated,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.intent_id == UNKNOWN_INTENT
    }
}
