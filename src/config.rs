//! Configuration - scoring weights, thresholds and stop words
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! [scoring]
//! min_accept_score = 3.0
//! phrase_policy = "aggregate"
//!
//! [tokenizer]
//! stop_words = ["the", "a", "an"]
//! ```

use crate::tokenizer::{Tokenizer, DEFAULT_STOP_WORDS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// What a complete phrase match does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhrasePolicy {
    /// The first intent with a complete phrase match wins immediately.
    ShortCircuit,

    /// Complete matches add the phrase weight; every intent is scored and
    /// thresholded.
    Aggregate,
}

/// Weights and thresholds for the scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Credit for a complete phrase match, and the cap on phrase credit
    pub phrase_weight: f32,

    /// Scale applied to `phrase_weight × ratio` for partial phrase matches
    pub partial_phrase_multiplier: f32,

    pub strong_weight: f32,

    /// Credit for a strong token matched within edit distance 1
    pub fuzzy_weight: f32,

    pub weak_weight: f32,

    /// Global acceptance threshold
    pub min_accept_score: f32,

    /// Multiplier for negatable intents when the message is negated
    pub negation_factor: f32,

    /// Message stems must be longer than this to be fuzzy-matched
    pub fuzzy_min_len: usize,

    pub phrase_policy: PhrasePolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            phrase_weight: 6.0,
            partial_phrase_multiplier: 0.5,
            strong_weight: 2.0,
            fuzzy_weight: 1.5,
            weak_weight: 1.0,
            min_accept_score: 4.0,
            negation_factor: 0.3,
            fuzzy_min_len: 3,
            phrase_policy: PhrasePolicy::ShortCircuit,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("phrase_weight", self.phrase_weight),
            ("strong_weight", self.strong_weight),
            ("fuzzy_weight", self.fuzzy_weight),
            ("weak_weight", self.weak_weight),
            ("min_accept_score", self.min_accept_score),
        ];
        for (field, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a non-negative number, got {}", value),
                });
            }
        }

        let factors = [
            ("partial_phrase_multiplier", self.partial_phrase_multiplier),
            ("negation_factor", self.negation_factor),
        ];
        for (field, value) in factors {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be within [0, 1], got {}", value),
                });
            }
        }

        if self.weak_weight == self.strong_weight {
            return Err(ConfigError::Invalid {
                field: "weak_weight",
                reason: "must differ from strong_weight".to_string(),
            });
        }

        if self.fuzzy_weight > self.strong_weight {
            return Err(ConfigError::Invalid {
                field: "fuzzy_weight",
                reason: format!(
                    "must not exceed strong_weight ({} > {})",
                    self.fuzzy_weight, self.strong_weight
                ),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub stop_words: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl TokenizerConfig {
    pub fn build(&self) -> Tokenizer {
        Tokenizer::new(&self.stop_words)
    }
}

/// Configuration for the intent engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    pub scoring: ScoringConfig,
    pub tokenizer: TokenizerConfig,
}

impl IntentConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: IntentConfig = toml::from_str(content)?;
        config.scoring.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loading config from: {}", path.display());
        Self::from_toml_str(&content)
    }
}
