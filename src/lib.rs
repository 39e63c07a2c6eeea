//! Intent Flow - Short-Utterance Intent Classification
//!
//! Classifies a short natural-language message into one of a configurable
//! set of intents, or reports it as `UNKNOWN`.
//!
//! # Architecture
//!
//! - **Tokenizer**: text → normalized tokens + stop-word-filtered stems
//! - **Stemmer**: Porter-style suffix stripping
//! - **Catalog**: validated, immutable intent definitions with precomputed stems
//! - **Matcher**: phrase / strong / weak token scoring with thresholds
//!
//! # Usage
//!
//! ```rust
//! use intent_flow::{Catalog, IntentConfig, IntentEngine};
//!
//! let config = IntentConfig::default();
//! let catalog = Catalog::builtin(config.tokenizer.build()).unwrap();
//! let engine = IntentEngine::new(catalog, config.scoring);
//!
//! let result = engine.detect("I want to place an order please");
//! assert_eq!(result.intent_id, "MAKE_ORDER");
//!
//! let result = engine.detect("asdf qwer zxcv");
//! assert!(result.is_unknown());
//! ```

pub mod types;
pub mod config;
pub mod stemmer;
pub mod tokenizer;
pub mod catalog;
pub mod matcher;

pub use catalog::{Catalog, CatalogError};
pub use config::{ConfigError, IntentConfig, PhrasePolicy, ScoringConfig, TokenizerConfig};
pub use tokenizer::{tokenize, Tokenizer};
pub use types::*;

use std::sync::Arc;

/// Main intent engine: a shared catalog plus scoring configuration
#[derive(Debug, Clone)]
pub struct IntentEngine {
    scoring: ScoringConfig,
    catalog: Arc<Catalog>,
}

impl IntentEngine {
    /// Create new intent engine
    pub fn new(catalog: impl Into<Arc<Catalog>>, scoring: ScoringConfig) -> Self {
        Self {
            scoring,
            catalog: catalog.into(),
        }
    }

    /// Build the catalog from definitions using the configured tokenizer.
    pub fn from_definitions(
        config: IntentConfig,
        definitions: Vec<IntentDefinition>,
    ) -> Result<Self, CatalogError> {
        let catalog = Catalog::new(definitions, config.tokenizer.build())?;
        Ok(Self::new(catalog, config.scoring))
    }

    /// Classify raw text
    pub fn detect(&self, text: &str) -> MatchResult {
        let message = self.catalog.tokenize(text);
        self.detect_tokens(&message)
    }

    /// Classify an already tokenized message
    pub fn detect_tokens(&self, message: &TokenizedMessage) -> MatchResult {
        matcher::detect(&self.catalog, &self.scoring, message)
    }

    /// Top `max_results` intents that clear their thresholds
    pub fn rank(&self, text: &str, max_results: usize) -> Vec<MatchResult> {
        let message = self.catalog.tokenize(text);
        matcher::rank(&self.catalog, &self.scoring, &message, max_results)
    }

    /// Human-readable scoring report
    pub fn explain(&self, text: &str) -> String {
        matcher::explain(&self.catalog, &self.scoring, text)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Get engine info
    pub fn info(&self) -> String {
        format!(
            "Intent Engine\n\
             Intents: {}\n\
             Phrase Policy: {:?}\n\
             Min Accept Score: {:.2}",
            self.catalog.len(),
            self.scoring.phrase_policy,
            self.scoring.min_accept_score
        )
    }
}

/// Builder for IntentConfig
pub struct IntentConfigBuilder {
    config: IntentConfig,
}

impl IntentConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: IntentConfig::default(),
        }
    }

    pub fn min_accept_score(mut self, score: f32) -> Self {
        self.config.scoring.min_accept_score = score;
        self
    }

    pub fn phrase_policy(mut self, policy: PhrasePolicy) -> Self {
        self.config.scoring.phrase_policy = policy;
        self
    }

    pub fn weights(mut self, phrase: f32, strong: f32, weak: f32) -> Self {
        self.config.scoring.phrase_weight = phrase;
        self.config.scoring.strong_weight = strong;
        self.config.scoring.weak_weight = weak;
        self
    }

    pub fn fuzzy(mut self, weight: f32, min_len: usize) -> Self {
        self.config.scoring.fuzzy_weight = weight;
        self.config.scoring.fuzzy_min_len = min_len;
        self
    }

    pub fn stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.tokenizer.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<IntentConfig, ConfigError> {
        self.config.scoring.validate()?;
        Ok(self.config)
    }
}

impl Default for IntentConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
