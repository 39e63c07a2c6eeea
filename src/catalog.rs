//! Intent Catalog - validated, immutable intent definitions
//!
//! The catalog is built once (from a JSON file, a string, or definitions in
//! code) and then shared read-only by every scoring call. Building it
//! normalizes each definition, rejects malformed ones, and precomputes the
//! stems the matcher compares against.

use crate::tokenizer::Tokenizer;
use crate::types::{IntentDefinition, UNKNOWN_INTENT};
use crate::stemmer;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Order-handling intents shipped with the binary.
const BUILTIN_CATALOG: &str = include_str!("../data/intents.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read intent file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("intent file path {0} is not a file")]
    NotAFile(PathBuf),

    #[error("malformed intent catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("intent #{index}: missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("intent `{id}`: {reason}")]
    InvalidIntent { id: String, reason: String },

    #[error("duplicate intent id `{0}`")]
    DuplicateId(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// On-disk layout: `{ "intents": [ ... ] }`
#[derive(Debug, Deserialize)]
struct CatalogFile {
    intents: Vec<IntentDefinition>,
}

/// A catalog phrase with its stems
#[derive(Debug, Clone)]
pub struct CompiledPhrase {
    pub text: String,
    pub stems: Vec<String>,
}

/// A catalog token with its stem
#[derive(Debug, Clone)]
pub struct CompiledToken {
    pub text: String,
    pub stem: String,
}

/// A definition ready for scoring
#[derive(Debug, Clone)]
pub struct CompiledIntent {
    pub definition: IntentDefinition,
    pub phrases: Vec<CompiledPhrase>,
    pub strong_tokens: Vec<CompiledToken>,
    pub weak_tokens: Vec<CompiledToken>,
}

impl CompiledIntent {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn label(&self) -> &str {
        &self.definition.label
    }
}

/// Immutable intent catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    tokenizer: Tokenizer,
    intents: Vec<CompiledIntent>,
}

impl Catalog {
    /// Validate and compile definitions. Declaration order is preserved and
    /// decides ties during scoring.
    pub fn new(definitions: Vec<IntentDefinition>, tokenizer: Tokenizer) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut intents = Vec::with_capacity(definitions.len());

        for (index, definition) in definitions.into_iter().enumerate() {
            let definition = normalize_definition(definition);
            validate_definition(index, &definition)?;

            if !seen.insert(definition.id.clone()) {
                return Err(CatalogError::DuplicateId(definition.id));
            }

            intents.push(compile(definition, &tokenizer)?);
        }

        log::debug!("Compiled catalog with {} intents", intents.len());

        Ok(Self { tokenizer, intents })
    }

    /// Parse a JSON catalog document.
    pub fn from_json_str(json: &str, tokenizer: Tokenizer) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.intents, tokenizer)
    }

    /// Load a JSON catalog file.
    pub fn load(path: impl AsRef<Path>, tokenizer: Tokenizer) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(CatalogError::NotAFile(path.to_path_buf()));
        }

        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = Self::from_json_str(&json, tokenizer)?;
        log::info!(
            "Loaded {} intents from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// The built-in order catalog (MAKE_ORDER, TRACK_ORDER, PAY_FOR_ORDER).
    pub fn builtin(tokenizer: Tokenizer) -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG, tokenizer)
    }

    /// Tokenize a message with the same pipeline the catalog was compiled with.
    pub fn tokenize(&self, text: &str) -> crate::types::TokenizedMessage {
        self.tokenizer.tokenize(text)
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn intents(&self) -> &[CompiledIntent] {
        &self.intents
    }

    pub fn get(&self, id: &str) -> Option<&CompiledIntent> {
        self.intents.iter().find(|i| i.id() == id)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Trim, lowercase and dedupe every string array, keeping first occurrences.
fn normalize_definition(mut definition: IntentDefinition) -> IntentDefinition {
    definition.id = definition.id.trim().to_string();
    definition.label = definition.label.trim().to_string();
    definition.phrases = normalize_array(definition.phrases);
    definition.strong_tokens = normalize_array(definition.strong_tokens);
    definition.weak_tokens = normalize_array(definition.weak_tokens);
    definition
}

fn normalize_array(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

fn validate_definition(index: usize, definition: &IntentDefinition) -> Result<()> {
    if definition.id.is_empty() {
        return Err(CatalogError::MissingField { index, field: "id" });
    }
    if definition.label.is_empty() {
        return Err(CatalogError::MissingField { index, field: "label" });
    }

    let invalid = |reason: String| CatalogError::InvalidIntent {
        id: definition.id.clone(),
        reason,
    };

    if definition.id == UNKNOWN_INTENT {
        return Err(invalid(format!("`{}` is reserved", UNKNOWN_INTENT)));
    }
    if definition.phrases.is_empty() {
        return Err(invalid("at least one phrase is required".to_string()));
    }
    if definition.phrases.iter().any(|p| p.is_empty()) {
        return Err(invalid("phrases must not be empty".to_string()));
    }
    if !definition.priority.is_finite() || definition.priority <= 0.0 {
        return Err(invalid(format!(
            "priority must be positive, got {}",
            definition.priority
        )));
    }
    if let Some(min_score) = definition.min_score {
        if !min_score.is_finite() || min_score < 0.0 {
            return Err(invalid(format!(
                "minScore must be non-negative, got {}",
                min_score
            )));
        }
    }

    Ok(())
}

fn compile(definition: IntentDefinition, tokenizer: &Tokenizer) -> Result<CompiledIntent> {
    let phrases = definition
        .phrases
        .iter()
        .map(|phrase| {
            let stems = tokenizer.stems_of(phrase);
            if stems.is_empty() {
                log::warn!(
                    "Intent {}: phrase \"{}\" has only stop words and will never match",
                    definition.id,
                    phrase
                );
            }
            CompiledPhrase {
                text: phrase.clone(),
                stems,
            }
        })
        .collect();

    let strong_tokens = compile_tokens(&definition, &definition.strong_tokens, tokenizer)?;
    let weak_tokens = compile_tokens(&definition, &definition.weak_tokens, tokenizer)?;

    Ok(CompiledIntent {
        definition,
        phrases,
        strong_tokens,
        weak_tokens,
    })
}

fn compile_tokens(
    definition: &IntentDefinition,
    tokens: &[String],
    tokenizer: &Tokenizer,
) -> Result<Vec<CompiledToken>> {
    tokens
        .iter()
        .map(|token| {
            let words = tokenizer.normalize(token);
            let [word] = words.as_slice() else {
                return Err(CatalogError::InvalidIntent {
                    id: definition.id.clone(),
                    reason: format!("token \"{}\" must be a single word", token),
                });
            };

            if tokenizer.is_stop_word(word) {
                log::warn!(
                    "Intent {}: token \"{}\" is a stop word and will never match",
                    definition.id,
                    token
                );
            }

            Ok(CompiledToken {
                text: token.clone(),
                stem: stemmer::stem(word),
            })
        })
        .collect()
}
