//! LLM-backed intent classification
//!
//! Asks the backend for a one-word AGRICULTURE / NON_AGRICULTURE label at
//! temperature 0. Anything that is not exactly one of the two labels is
//! reported as `Judgment::Unknown`; the gate decides what that means.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use agri_faq_core::{Error, IntentClassifier, Judgment, Result};

use crate::backend::{GenerationOptions, LlmBackend};
use crate::prompt::PromptBuilder;

const IN_DOMAIN_LABELS: &[&str] = &["AGRICULTURE", "AGRICULTURAL", "IN_DOMAIN"];
const OUT_OF_DOMAIN_LABELS: &[&str] = &["NON_AGRICULTURE", "NON_AGRICULTURAL", "OUT_OF_DOMAIN"];
const NEGATIONS: &[&str] = &["NOT", "NO"];

/// Label answers are a word or two
const CLASSIFIER_MAX_TOKENS: usize = 8;

pub struct LlmIntentClassifier {
    backend: Arc<dyn LlmBackend>,
}

impl LlmIntentClassifier {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }
}

/// Map a free-text label to a judgment
///
/// Exactly one side must be named; negated, mixed or empty answers are
/// `Unknown`.
pub fn parse_judgment(answer: &str) -> Judgment {
    let normalized = answer.to_uppercase().replace('-', "_");
    let tokens: HashSet<&str> = normalized
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect();

    let in_domain = IN_DOMAIN_LABELS.iter().any(|l| tokens.contains(l));
    let out_of_domain = OUT_OF_DOMAIN_LABELS.iter().any(|l| tokens.contains(l));
    let negated = NEGATIONS.iter().any(|n| tokens.contains(n));

    match (in_domain, out_of_domain) {
        (true, false) if !negated => Judgment::InDomain,
        (false, true) => Judgment::OutOfDomain,
        _ => Judgment::Unknown,
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, text: &str) -> Result<Judgment> {
        self.classify_with_hints(text, &[]).await
    }

    async fn classify_with_hints(&self, text: &str, hints: &[String]) -> Result<Judgment> {
        let messages = PromptBuilder::classification_messages(text, hints);
        let result = self
            .backend
            .generate(&messages, GenerationOptions::deterministic(CLASSIFIER_MAX_TOKENS))
            .await
            .map_err(|e| Error::ClassificationUnavailable(e.to_string()))?;

        let judgment = parse_judgment(&result.text);
        if judgment == Judgment::Unknown {
            tracing::warn!(answer = %result.text.trim(), "Unparseable classifier answer");
        } else {
            tracing::debug!(?judgment, hints = hints.len(), "Query classified");
        }
        Ok(judgment)
    }

    fn name(&self) -> &str {
        "llm"
    }
}
