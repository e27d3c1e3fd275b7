//! Domain term correction
//!
//! Rewrites known misspellings and mis-transcriptions of product, crop and
//! pest names to their canonical spelling before any semantic processing.
//! Matching is whole-word, case-insensitive and longest-first, so
//! "powder mildew" becomes "powdery mildew" rather than having "mildew"
//! matched on its own.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use agri_faq_config::VocabularyConfig;

use crate::pattern::{build_term_pattern, lookup_key};
use crate::Result;

/// Passes over the text before giving up on reaching a fixed point
const MAX_PASSES: usize = 8;

/// A single applied correction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// Text as it appeared in the query
    pub original: String,
    /// Canonical replacement
    pub corrected: String,
    /// Byte offset in the text the pass ran over
    pub position: usize,
}

/// Immutable term-correction table
#[derive(Debug, Clone)]
pub struct TermNormalizer {
    pattern: Option<Regex>,
    /// lookup key -> canonical term
    lookup: HashMap<String, String>,
}

impl TermNormalizer {
    /// Build from `(surface form, canonical)` pairs.
    ///
    /// Canonical terms always map to themselves. A variation whose key is
    /// another entry's canonical term is dropped, otherwise the output of one
    /// correction could be rewritten again by a later call.
    pub fn new<I, S, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(s, t)| (s.as_ref().to_string(), t.as_ref().trim().to_string()))
            .filter(|(s, t)| !lookup_key(s).is_empty() && !t.is_empty())
            .collect();

        let mut lookup: HashMap<String, String> = HashMap::new();

        for (_, canonical) in &pairs {
            let key = lookup_key(canonical);
            match lookup.get(&key) {
                Some(existing) if existing != canonical => {
                    tracing::warn!(
                        term = %canonical,
                        existing = %existing,
                        "Canonical term declared twice with different casing, keeping first"
                    );
                }
                Some(_) => {}
                None => {
                    lookup.insert(key, canonical.clone());
                }
            }
        }

        for (variation, canonical) in &pairs {
            let key = lookup_key(variation);
            match lookup.get(&key) {
                Some(existing) if lookup_key(existing) != lookup_key(canonical) => {
                    tracing::warn!(
                        variation = %variation,
                        canonical = %canonical,
                        existing = %existing,
                        "Variation conflicts with another term, skipping"
                    );
                }
                Some(_) => {}
                None => {
                    lookup.insert(key, canonical.clone());
                }
            }
        }

        let pattern = build_term_pattern(lookup.keys().map(String::as_str))?;

        tracing::debug!(terms = lookup.len(), "Term normalizer built");

        Ok(Self { pattern, lookup })
    }

    /// Build from a vocabulary file's categories
    pub fn from_vocabulary(vocabulary: &VocabularyConfig) -> Result<Self> {
        Self::new(vocabulary.correction_pairs())
    }

    /// Normalizer over the built-in product and crop table
    pub fn builtin() -> Result<Self> {
        Self::from_vocabulary(&VocabularyConfig::builtin())
    }

    /// A normalizer that passes every input through unchanged
    pub fn empty() -> Self {
        Self {
            pattern: None,
            lookup: HashMap::new(),
        }
    }

    /// Number of surface forms (canonical terms included)
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Canonical spelling for a single term, if known
    pub fn canonical(&self, term: &str) -> Option<&str> {
        self.lookup.get(&lookup_key(term)).map(String::as_str)
    }

    /// Correct known domain terms. Never fails; unmatched text is returned as is.
    pub fn normalize(&self, raw: &str) -> String {
        self.normalize_with_corrections(raw).0
    }

    /// Correct known domain terms and report what changed
    pub fn normalize_with_corrections(&self, raw: &str) -> (String, Vec<Correction>) {
        let Some(pattern) = &self.pattern else {
            return (raw.to_string(), Vec::new());
        };

        let mut text = raw.to_string();
        let mut corrections = Vec::new();

        for _ in 0..MAX_PASSES {
            let next = self.apply(pattern, &text, &mut corrections);
            if next == text {
                return (text, corrections);
            }
            text = next;
        }

        tracing::warn!(query = %raw, "Term correction did not settle");
        (text, corrections)
    }

    fn apply(&self, pattern: &Regex, text: &str, corrections: &mut Vec<Correction>) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for m in pattern.find_iter(text) {
            out.push_str(&text[last..m.start()]);
            match self.lookup.get(&lookup_key(m.as_str())) {
                Some(canonical) => {
                    if m.as_str() != canonical {
                        corrections.push(Correction {
                            original: m.as_str().to_string(),
                            corrected: canonical.clone(),
                            position: m.start(),
                        });
                    }
                    out.push_str(canonical);
                }
                None => out.push_str(m.as_str()),
            }
            last = m.end();
        }
        out.push_str(&text[last..]);
        out
    }
}

/// Cache key for an already term-corrected query: trimmed, case-folded,
/// whitespace collapsed
pub fn cache_key(normalized: &str) -> String {
    lookup_key(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TermNormalizer {
        TermNormalizer::builtin().unwrap()
    }

    #[test]
    fn test_corrects_product_names() {
        let n = normalizer();
        assert_eq!(
            n.normalize("What is Dormolin Vegetative used for?"),
            "What is Dormulin Vegetative used for?"
        );
        assert_eq!(
            n.normalize("What is Acre Shield dosage for tometo?"),
            "What is Akre Shield dosage for tomato?"
        );
        assert_eq!(
            n.normalize("How to apply Tracks Sure for chilli?"),
            "How to apply Tracs Sure for chilli?"
        );
    }

    #[test]
    fn test_multi_word_before_single_word() {
        let n = normalizer();
        assert_eq!(
            n.normalize("How to control powder mildew in chilly?"),
            "How to control powdery mildew in chilli?"
        );
        assert_eq!(
            n.normalize("How to treat bacterial   wilth in tomato?"),
            "How to treat bacterial wilt in tomato?"
        );
    }

    #[test]
    fn test_no_partial_word_matches() {
        let n = normalizer();
        assert_eq!(n.normalize("striptease and chillyness"), "striptease and chillyness");
    }

    #[test]
    fn test_unmatched_passthrough() {
        let n = normalizer();
        let input = "  Best laptops for gaming in 2024  ";
        assert_eq!(n.normalize(input), input);
        assert_eq!(n.normalize(""), "");
        assert_eq!(TermNormalizer::empty().normalize("trips"), "trips");
    }

    #[test]
    fn test_canonical_casing() {
        let n = normalizer();
        assert_eq!(n.normalize("what about DORMULIN?"), "what about Dormulin?");
        assert_eq!(n.canonical("zetal  select"), Some("Zetol Select"));
        assert_eq!(n.canonical("banana"), None);
    }

    #[test]
    fn test_idempotent_for_every_known_term() {
        let vocab = VocabularyConfig::builtin();
        let n = TermNormalizer::from_vocabulary(&vocab).unwrap();

        for (surface, _) in vocab.correction_pairs() {
            for text in [
                surface.clone(),
                surface.to_uppercase(),
                format!("how to use {} on crops?", surface),
            ] {
                let once = n.normalize(&text);
                assert_eq!(n.normalize(&once), once, "not idempotent for {:?}", text);
            }
        }
    }

    #[test]
    fn test_corrections_reported() {
        let n = normalizer();
        let (text, corrections) =
            n.normalize_with_corrections("How to control trips in chilly?");
        assert_eq!(text, "How to control thrips in chilli?");
        assert_eq!(corrections.len(), 2);
        assert_eq!(corrections[0].original, "trips");
        assert_eq!(corrections[0].corrected, "thrips");
        assert_eq!(corrections[0].position, 15);
        assert_eq!(corrections[1].corrected, "chilli");
    }

    #[test]
    fn test_conflicting_variation_skipped() {
        // "tomato" is canonical, so it cannot also be a variation of "potato"
        let n = TermNormalizer::new([
            ("tomato", "tomato"),
            ("potato", "potato"),
            ("tomato", "potato"),
            ("potatoe", "potato"),
        ])
        .unwrap();

        assert_eq!(n.normalize("tomato and potatoe"), "tomato and potato");
        let once = n.normalize("tomato");
        assert_eq!(n.normalize(&once), once);
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(
            cache_key("  What is   Dormulin\tVegetative used for?  "),
            "what is dormulin vegetative used for?"
        );
        assert_eq!(
            cache_key("WHAT IS DORMULIN VEGETATIVE USED FOR?"),
            cache_key("what is dormulin vegetative used for?")
        );
    }

    #[test]
    fn test_misspelled_query_shares_cache_key() {
        let n = normalizer();
        let a = cache_key(&n.normalize("What is Dormulin Vegetative used for?"));
        let b = cache_key(&n.normalize("What is Dormolin Vegetative used for?"));
        assert_eq!(a, b);
    }
}
