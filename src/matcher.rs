//! Matcher - phrase and token scoring over the intent catalog
//!
//! Each intent is scored in three passes over the message stems: phrases,
//! strong tokens (with a fuzzy fallback), then weak tokens. A stem position
//! claimed by one pass is unavailable to the later ones, so a single word
//! never scores twice for the same intent.
//!
//! Under [`PhrasePolicy::ShortCircuit`] the first intent with a complete
//! phrase match is returned immediately. Otherwise the best-scoring intent
//! is accepted only if it clears its threshold.

use crate::catalog::{Catalog, CompiledIntent, CompiledToken};
use crate::config::{PhrasePolicy, ScoringConfig};
use crate::tokenizer::detect_negation;
use crate::types::{MatchResult, TokenizedMessage};

/// Largest edit distance accepted by the fuzzy fallback.
const FUZZY_MAX_DISTANCE: usize = 1;

/// Matches reported by [`explain`].
const EXPLAIN_LIMIT: usize = 5;

/// Score breakdown for a single intent
#[derive(Debug)]
struct IntentScore<'a> {
    intent: &'a CompiledIntent,
    score: f32,
    confidence: f32,
    matched_phrase: Option<&'a str>,
    strong: Vec<&'a str>,
    weak: Vec<&'a str>,
    fuzzy: Vec<&'a str>,
    /// A complete phrase ended scoring early
    decisive: bool,
}

impl IntentScore<'_> {
    fn threshold(&self, config: &ScoringConfig) -> f32 {
        self.intent
            .definition
            .min_score
            .unwrap_or(config.min_accept_score)
    }

    fn into_result(self, negated: bool) -> MatchResult {
        MatchResult {
            intent_id: self.intent.id().to_string(),
            label: self.intent.label().to_string(),
            score: self.score,
            matched_phrase: self.matched_phrase.map(str::to_string),
            strong_tokens: self.strong.into_iter().map(str::to_string).collect(),
            weak_tokens: self.weak.into_iter().map(str::to_string).collect(),
            fuzzy_tokens: self.fuzzy.into_iter().map(str::to_string).collect(),
            confidence: self.confidence,
            negated,
        }
    }
}

/// Classify a tokenized message against the catalog.
///
/// Returns the UNKNOWN result when the catalog is empty, nothing scores, or
/// the best score is below the winning intent's threshold.
pub fn detect(catalog: &Catalog, config: &ScoringConfig, message: &TokenizedMessage) -> MatchResult {
    let negated = detect_negation(&message.tokens);
    let short_circuit = config.phrase_policy == PhrasePolicy::ShortCircuit;
    let mut best: Option<IntentScore> = None;

    for intent in catalog.intents() {
        let scored = score_intent(intent, config, &message.stems, negated, short_circuit);

        if scored.decisive {
            log::debug!(
                "Complete phrase \"{}\" for {}, skipping remaining intents",
                scored.matched_phrase.unwrap_or_default(),
                intent.id()
            );
            return scored.into_result(negated);
        }

        log::debug!("Intent {} scored {:.2}", intent.id(), scored.score);

        let best_score = best.as_ref().map_or(0.0, |b| b.score);
        if scored.score > best_score {
            best = Some(scored);
        }
    }

    match best {
        Some(best) if best.score >= best.threshold(config) => best.into_result(negated),
        Some(best) => {
            log::debug!(
                "Best intent {} scored {:.2}, below threshold {:.2}",
                best.intent.id(),
                best.score,
                best.threshold(config)
            );
            MatchResult::unknown(best.score, negated)
        }
        None => MatchResult::unknown(0.0, negated),
    }
}

/// Score every intent without short-circuiting and return those that clear
/// their threshold, best first. Equal scores keep declaration order.
///
/// Yields a single UNKNOWN entry when no intent qualifies.
pub fn rank(
    catalog: &Catalog,
    config: &ScoringConfig,
    message: &TokenizedMessage,
    max_results: usize,
) -> Vec<MatchResult> {
    let negated = detect_negation(&message.tokens);

    let mut accepted: Vec<IntentScore> = catalog
        .intents()
        .iter()
        .map(|intent| score_intent(intent, config, &message.stems, negated, false))
        .filter(|s| s.score > 0.0 && s.score >= s.threshold(config))
        .collect();

    if accepted.is_empty() {
        return vec![MatchResult::unknown(0.0, negated)];
    }

    accepted.sort_by(|a, b| b.score.total_cmp(&a.score));
    accepted.truncate(max_results);
    accepted
        .into_iter()
        .map(|s| s.into_result(negated))
        .collect()
}

/// Human-readable report of the top matches for `text`.
pub fn explain(catalog: &Catalog, config: &ScoringConfig, text: &str) -> String {
    let message = catalog.tokenize(text);
    let results = rank(catalog, config, &message, EXPLAIN_LIMIT);

    let mut out = String::new();
    out.push_str(&format!("Message: \"{}\"\n", text));
    out.push_str(&format!("Stems: [{}]\n\n", message.stems.join(", ")));
    out.push_str("Top Intent Matches:\n");
    out.push_str(&format!("{}\n", "=".repeat(50)));

    for (index, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} ({})\n",
            index + 1,
            result.label,
            result.intent_id
        ));
        out.push_str(&format!(
            "   Score: {:.2} | Confidence: {:.0}%\n",
            result.score, result.confidence
        ));
        out.push_str(&format!(
            "   Matched Phrase: {}\n",
            result.matched_phrase.as_deref().unwrap_or("none")
        ));
        out.push_str(&format!("   Strong Tokens: [{}]\n", result.strong_tokens.join(", ")));
        out.push_str(&format!("   Weak Tokens: [{}]\n", result.weak_tokens.join(", ")));
        out.push_str(&format!("   Fuzzy Tokens: [{}]\n", result.fuzzy_tokens.join(", ")));
        out.push_str(&format!("   Has Negation: {}\n", result.negated));
    }

    out
}

fn score_intent<'a>(
    intent: &'a CompiledIntent,
    config: &ScoringConfig,
    stems: &[String],
    negated: bool,
    short_circuit: bool,
) -> IntentScore<'a> {
    let definition = &intent.definition;
    let suppressed = negated && definition.can_be_negated;
    let max_score = max_attainable(intent, config);

    let mut consumed = vec![false; stems.len()];
    let mut phrase_credit: f32 = 0.0;
    let mut matched_phrase: Option<(&str, f32)> = None;

    // 1. Phrases
    for phrase in &intent.phrases {
        if phrase.stems.is_empty() {
            continue;
        }

        let positions = match_phrase(&phrase.stems, stems);
        if positions.is_empty() {
            continue;
        }

        let credit = if positions.len() == phrase.stems.len() {
            if short_circuit && !suppressed {
                return IntentScore {
                    intent,
                    score: config.phrase_weight * definition.priority,
                    confidence: confidence(config.phrase_weight, max_score),
                    matched_phrase: Some(phrase.text.as_str()),
                    strong: Vec::new(),
                    weak: Vec::new(),
                    fuzzy: Vec::new(),
                    decisive: true,
                };
            }
            config.phrase_weight
        } else {
            let ratio = positions.len() as f32 / phrase.stems.len() as f32;
            config.phrase_weight * ratio * config.partial_phrase_multiplier
        };

        log::trace!(
            "{}: phrase \"{}\" matched {}/{} stems, credit {:.2}",
            intent.id(),
            phrase.text,
            positions.len(),
            phrase.stems.len(),
            credit
        );

        for position in positions {
            consumed[position] = true;
        }
        phrase_credit += credit;
        if matched_phrase.map_or(true, |(_, best)| credit > best) {
            matched_phrase = Some((phrase.text.as_str(), credit));
        }
    }

    let mut raw = phrase_credit.min(config.phrase_weight);

    // 2. Strong tokens, fuzzy fallback
    let mut strong = Vec::new();
    let mut fuzzy = Vec::new();
    for token in &intent.strong_tokens {
        if let Some(position) = find_exact(token, stems, &consumed) {
            consumed[position] = true;
            raw += config.strong_weight;
            strong.push(token.text.as_str());
        } else if let Some(position) = find_fuzzy(token, stems, &consumed, config.fuzzy_min_len) {
            log::trace!(
                "{}: fuzzy token \"{}\" ~ \"{}\"",
                intent.id(),
                token.text,
                stems[position]
            );
            consumed[position] = true;
            raw += config.fuzzy_weight;
            fuzzy.push(token.text.as_str());
        }
    }

    // 3. Weak tokens, exact only
    let mut weak = Vec::new();
    for token in &intent.weak_tokens {
        if let Some(position) = find_exact(token, stems, &consumed) {
            consumed[position] = true;
            raw += config.weak_weight;
            weak.push(token.text.as_str());
        }
    }

    if suppressed {
        raw *= config.negation_factor;
    }

    IntentScore {
        intent,
        score: raw * definition.priority,
        confidence: confidence(raw, max_score),
        matched_phrase: matched_phrase.map(|(text, _)| text),
        strong,
        weak,
        fuzzy,
        decisive: false,
    }
}

/// Positions of message stems matching each phrase stem, each position used
/// at most once.
fn match_phrase(phrase_stems: &[String], stems: &[String]) -> Vec<usize> {
    let mut used = vec![false; stems.len()];
    let mut positions = Vec::new();

    for phrase_stem in phrase_stems {
        let found = stems
            .iter()
            .enumerate()
            .position(|(i, s)| !used[i] && s == phrase_stem);
        if let Some(i) = found {
            used[i] = true;
            positions.push(i);
        }
    }

    positions
}

fn find_exact(token: &CompiledToken, stems: &[String], consumed: &[bool]) -> Option<usize> {
    stems
        .iter()
        .enumerate()
        .position(|(i, s)| !consumed[i] && *s == token.stem)
}

/// Only message stems longer than `min_len` are candidates. Catalog tokens
/// of any length may match them.
fn find_fuzzy(
    token: &CompiledToken,
    stems: &[String],
    consumed: &[bool],
    min_len: usize,
) -> Option<usize> {
    stems.iter().enumerate().position(|(i, s)| {
        !consumed[i]
            && s.len() > min_len
            && strsim::levenshtein(&token.stem, s) <= FUZZY_MAX_DISTANCE
    })
}

fn max_attainable(intent: &CompiledIntent, config: &ScoringConfig) -> f32 {
    let phrase = if intent.phrases.is_empty() {
        0.0
    } else {
        config.phrase_weight
    };
    phrase
        + intent.strong_tokens.len() as f32 * config.strong_weight
        + intent.weak_tokens.len() as f32 * config.weak_weight
}

fn confidence(score: f32, max_score: f32) -> f32 {
    if max_score > 0.0 {
        (score / max_score * 100.0).min(100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;
    use crate::types::IntentDefinition;

    fn builtin() -> Catalog {
        Catalog::builtin(Tokenizer::default()).unwrap()
    }

    fn catalog(definitions: Vec<IntentDefinition>) -> Catalog {
        Catalog::new(definitions, Tokenizer::default()).unwrap()
    }

    fn classify(catalog: &Catalog, text: &str) -> MatchResult {
        detect(catalog, &ScoringConfig::default(), &catalog.tokenize(text))
    }

    fn aggregate() -> ScoringConfig {
        ScoringConfig {
            phrase_policy: PhrasePolicy::Aggregate,
            ..ScoringConfig::default()
        }
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_complete_phrase_short_circuits() {
        let result = classify(&builtin(), "I want to place an order please");

        assert_eq!(result.intent_id, "MAKE_ORDER");
        assert_eq!(result.label, "Make Order");
        assert_eq!(result.matched_phrase.as_deref(), Some("place an order"));
        assert_eq!(result.score, ScoringConfig::default().phrase_weight);
        assert!(result.strong_tokens.is_empty());
    }

    #[test]
    fn test_short_circuit_ignores_later_token_overlap() {
        let catalog = catalog(vec![
            IntentDefinition::new("A", "A").phrases(["place an order"]),
            IntentDefinition::new("B", "B")
                .phrases(["nothing here"])
                .strong_tokens(["place", "order", "please"])
                .weak_tokens(["want"]),
        ]);

        let result = classify(&catalog, "I want to place an order please");
        assert_eq!(result.intent_id, "A");
        assert_eq!(result.score, 6.0);
    }

    #[test]
    fn test_first_complete_phrase_wins_over_higher_scores() {
        let catalog = catalog(vec![
            IntentDefinition::new("LOW", "Low").phrases(["order status"]),
            IntentDefinition::new("HIGH", "High")
                .phrases(["order status"])
                .priority(5.0),
        ]);

        assert_eq!(classify(&catalog, "order status").intent_id, "LOW");
    }

    #[test]
    fn test_partial_phrase_credit() {
        let catalog = catalog(vec![IntentDefinition::new("T", "Track")
            .phrases(["track my order"])
            .min_score(0.0)]);

        let result = classify(&catalog, "track it");
        assert_eq!(result.intent_id, "T");
        assert_close(result.score, 6.0 * (1.0 / 3.0) * 0.5);
        assert_eq!(result.matched_phrase.as_deref(), Some("track my order"));
    }

    #[test]
    fn test_phrase_credit_is_capped() {
        let catalog = catalog(vec![IntentDefinition::new("T", "Track")
            .phrases([
                "track my order",
                "my order status",
                "my order arrived",
                "my order please",
            ])
            .min_score(0.0)]);
        let config = aggregate();

        let result = detect(&catalog, &config, &catalog.tokenize("my order"));
        assert_close(result.score, config.phrase_weight);
    }

    #[test]
    fn test_aggregate_policy_scores_complete_phrase_without_exit() {
        let catalog = builtin();
        let config = aggregate();
        let result = detect(&catalog, &config, &catalog.tokenize("I want to place an order please"));

        assert_eq!(result.intent_id, "MAKE_ORDER");
        assert_eq!(result.matched_phrase.as_deref(), Some("place an order"));
        assert_close(result.score, config.phrase_weight);
        assert!(result.strong_tokens.is_empty());
        assert!(result.weak_tokens.is_empty());
    }

    #[test]
    fn test_fuzzy_strong_token() {
        let result = classify(&builtin(), "wheres my trackk");

        assert_eq!(result.intent_id, "TRACK_ORDER");
        assert_eq!(result.fuzzy_tokens, vec!["track"]);
        assert!(!result.strong_tokens.contains(&"track".to_string()));
    }

    #[test]
    fn test_fuzzy_scores_fuzzy_weight() {
        let catalog = catalog(vec![IntentDefinition::new("T", "Track")
            .phrases(["order status"])
            .strong_tokens(["track"])
            .min_score(1.0)]);
        let config = ScoringConfig::default();

        let result = classify(&catalog, "trackk");
        assert_eq!(result.intent_id, "T");
        assert_eq!(result.score, config.fuzzy_weight);
        assert_ne!(result.score, config.strong_weight);
        assert_eq!(result.fuzzy_tokens, vec!["track"]);
    }

    #[test]
    fn test_fuzzy_requires_minimum_length() {
        let catalog = catalog(vec![IntentDefinition::new("P", "Pay")
            .phrases(["payment due"])
            .strong_tokens(["fee"])
            .min_score(0.0)]);

        let result = classify(&catalog, "feed");
        assert_eq!(result.intent_id, "P");
        assert_eq!(result.fuzzy_tokens, vec!["fee"]);
        assert!(result.strong_tokens.is_empty());
        assert_close(result.score, ScoringConfig::default().fuzzy_weight);

        // "fed" is too short to be a fuzzy candidate
        let result = classify(&catalog, "fed");
        assert!(result.is_unknown());
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_weak_tokens_are_exact_only() {
        let catalog = catalog(vec![IntentDefinition::new("P", "Pay")
            .phrases(["payment due"])
            .weak_tokens(["money"])
            .min_score(0.5)]);

        assert!(classify(&catalog, "monney").is_unknown());

        let result = classify(&catalog, "money");
        assert_eq!(result.score, ScoringConfig::default().weak_weight);
        assert_eq!(result.weak_tokens, vec!["money"]);
    }

    #[test]
    fn test_no_double_counting_across_tiers() {
        let catalog = catalog(vec![IntentDefinition::new("O", "Order")
            .phrases(["order status"])
            .strong_tokens(["order"])
            .weak_tokens(["order", "now"])
            .min_score(0.0)]);

        let result = detect(&catalog, &aggregate(), &catalog.tokenize("order now"));
        // "order" is claimed by the partial phrase, "now" by the weak tier.
        assert!(result.strong_tokens.is_empty());
        assert_eq!(result.weak_tokens, vec!["now"]);
        assert_close(result.score, 6.0 * 0.5 * 0.5 + 1.0);
    }

    #[test]
    fn test_strong_token_consumes_before_weak() {
        let catalog = catalog(vec![IntentDefinition::new("O", "Order")
            .phrases(["buy flowers"])
            .strong_tokens(["order"])
            .weak_tokens(["order"])
            .min_score(0.0)]);

        let result = classify(&catalog, "order");
        assert_eq!(result.strong_tokens, vec!["order"]);
        assert!(result.weak_tokens.is_empty());
        assert_eq!(result.score, 2.0);
    }

    #[test]
    fn test_contributions_never_exceed_stems() {
        let catalog = builtin();
        let config = aggregate();
        let messages = [
            "track track track my order",
            "order order order",
            "pay pay the payment balance due now",
            "where where is my delivery rider",
        ];

        for text in messages {
            let message = catalog.tokenize(text);
            for result in rank(&catalog, &config, &message, 10) {
                let used = result.strong_tokens.len()
                    + result.weak_tokens.len()
                    + result.fuzzy_tokens.len();
                assert!(used <= message.stems.len(), "{:?} for {:?}", result, text);
            }
        }
    }

    #[test]
    fn test_below_threshold_is_unknown() {
        let catalog = catalog(vec![IntentDefinition::new("O", "Order")
            .phrases(["buy flowers"])
            .strong_tokens(["order"])]);

        let result = classify(&catalog, "order");
        assert!(result.is_unknown());
        assert_eq!(result.label, "UNKNOWN");
        assert_eq!(result.score, 2.0);
        assert_eq!(result.matched_phrase, None);
    }

    #[test]
    fn test_intent_threshold_override() {
        let lenient = catalog(vec![IntentDefinition::new("O", "Order")
            .phrases(["buy flowers"])
            .strong_tokens(["order"])
            .min_score(2.0)]);
        assert_eq!(classify(&lenient, "order").intent_id, "O");

        let strict = catalog(vec![IntentDefinition::new("O", "Order")
            .phrases(["alpha beta"])
            .strong_tokens(["order", "purchase", "buy"])
            .min_score(10.0)]);
        let result = classify(&strict, "order purchase buy");
        assert!(result.is_unknown());
        assert_eq!(result.score, 6.0);
    }

    #[test]
    fn test_gibberish_is_unknown() {
        let result = classify(&builtin(), "asdf qwer zxcv");
        assert!(result.is_unknown());
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_empty_message_and_empty_catalog() {
        let result = classify(&builtin(), "");
        assert!(result.is_unknown());
        assert_eq!(result.score, 0.0);

        let empty = catalog(vec![]);
        let result = classify(&empty, "track my order");
        assert!(result.is_unknown());
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let catalog = catalog(vec![
            IntentDefinition::new("FIRST", "First")
                .phrases(["alpha beta"])
                .strong_tokens(["order"])
                .min_score(1.0),
            IntentDefinition::new("SECOND", "Second")
                .phrases(["gamma delta"])
                .strong_tokens(["order"])
                .min_score(1.0),
        ]);

        assert_eq!(classify(&catalog, "order").intent_id, "FIRST");
    }

    #[test]
    fn test_priority_multiplies_score() {
        let catalog = catalog(vec![
            IntentDefinition::new("PLAIN", "Plain")
                .phrases(["alpha beta"])
                .strong_tokens(["order", "buy"]),
            IntentDefinition::new("BOOSTED", "Boosted")
                .phrases(["gamma delta"])
                .strong_tokens(["order", "buy"])
                .priority(1.5),
        ]);

        let result = classify(&catalog, "buy order");
        assert_eq!(result.intent_id, "BOOSTED");
        assert_eq!(result.score, 6.0);
    }

    #[test]
    fn test_negation_suppresses_intent() {
        let negatable = catalog(vec![IntentDefinition::new("A", "Order")
            .phrases(["place an order"])
            .strong_tokens(["order"])]);

        let result = classify(&negatable, "do not place an order");
        assert!(result.is_unknown());
        assert!(result.negated);
        assert_close(result.score, 6.0 * 0.3);

        let firm = catalog(vec![IntentDefinition::new("A", "Order")
            .phrases(["place an order"])
            .can_be_negated(false)]);

        let result = classify(&firm, "I don't care, place an order");
        assert_eq!(result.intent_id, "A");
        assert!(result.negated);
        assert_eq!(result.score, 6.0);
    }

    #[test]
    fn test_confidence_is_relative_to_maximum() {
        let catalog = catalog(vec![IntentDefinition::new("O", "Order")
            .phrases(["buy flowers"])
            .strong_tokens(["order", "purchase"])
            .min_score(0.0)]);

        // max = 6 + 2 * 2 = 10
        let result = classify(&catalog, "order");
        assert_close(result.confidence, 20.0);

        let result = classify(&catalog, "buy flowers");
        assert_close(result.confidence, 60.0);
    }

    #[test]
    fn test_rank_orders_by_score() {
        let catalog = builtin();
        let config = aggregate();
        let message = catalog.tokenize("where is my order, I want to pay the balance due");
        let results = rank(&catalog, &config, &message, 3);

        assert!(!results.is_empty());
        assert!(results.iter().all(|r| !r.is_unknown()));
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_rank_unknown_when_nothing_qualifies() {
        let catalog = builtin();
        let results = rank(&catalog, &aggregate(), &catalog.tokenize("asdf"), 3);

        assert_eq!(results.len(), 1);
        assert!(results[0].is_unknown());
    }

    #[test]
    fn test_rank_truncates() {
        let catalog = catalog(vec![
            IntentDefinition::new("A", "A").phrases(["order"]).min_score(0.0),
            IntentDefinition::new("B", "B").phrases(["order"]).min_score(0.0),
            IntentDefinition::new("C", "C").phrases(["order"]).min_score(0.0),
        ]);

        let results = rank(&catalog, &aggregate(), &catalog.tokenize("order"), 2);
        let ids: Vec<&str> = results.iter().map(|r| r.intent_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_explain_report() {
        let catalog = builtin();
        let report = explain(&catalog, &ScoringConfig::default(), "track my order");

        assert!(report.contains("Message: \"track my order\""));
        assert!(report.contains("Track Order (TRACK_ORDER)"));
        assert!(report.contains("Has Negation: false"));
        assert!(report.contains("Stems: [track, my, order]\n\nTop Intent Matches:\n"));
        assert!(report.lines().any(|line| line.ends_with(". Track Order (TRACK_ORDER)")));
    }
}
