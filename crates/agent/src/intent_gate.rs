//! Intent gate
//!
//! Decides IN_DOMAIN / OUT_OF_DOMAIN for a normalized query. The external
//! classifier supplies the judgment; the gate owns the policy:
//!
//! | Evidence | Intent |
//! |---|---|
//! | lexicon: off-domain terms and no agriculture term | OUT_OF_DOMAIN (no external call) |
//! | classifier: IN_DOMAIN | IN_DOMAIN |
//! | classifier: OUT_OF_DOMAIN or UNKNOWN | OUT_OF_DOMAIN |
//! | classifier failed after retries | OUT_OF_DOMAIN (degraded) |
//!
//! The lexicon never admits a query on its own.

use std::sync::Arc;
use std::time::Instant;

use agri_faq_core::{Intent, IntentClassifier, Judgment, RetryPolicy};
use agri_faq_text_processing::DomainLexicon;

/// How the gate reached its decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateReason {
    /// Rejected by the off-domain lexicon; carries the matched terms
    Lexicon(Vec<String>),
    /// The classifier returned a judgment
    Classified(Judgment),
    /// The classifier could not be reached
    ClassifierFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub intent: Intent,
    pub reason: GateReason,
    /// Agriculture terms spotted in the query
    pub hints: Vec<String>,
    pub elapsed_ms: u64,
}

impl GateDecision {
    /// Produced by the failure default rather than a judgment
    pub fn is_degraded(&self) -> bool {
        matches!(self.reason, GateReason::ClassifierFailed(_))
    }
}

pub struct IntentGate {
    classifier: Arc<dyn IntentClassifier>,
    lexicon: Option<Arc<DomainLexicon>>,
    retry: RetryPolicy,
}

impl IntentGate {
    pub fn new(classifier: Arc<dyn IntentClassifier>, retry: RetryPolicy) -> Self {
        Self {
            classifier,
            lexicon: None,
            retry,
        }
    }

    /// Enable the off-domain lexicon pre-filter
    pub fn with_lexicon(mut self, lexicon: Arc<DomainLexicon>) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub async fn classify_intent(&self, normalized_query: &str) -> Intent {
        self.decide(normalized_query).await.intent
    }

    pub async fn decide(&self, normalized_query: &str) -> GateDecision {
        let start = Instant::now();

        let scan = self
            .lexicon
            .as_ref()
            .map(|lexicon| lexicon.scan(normalized_query))
            .unwrap_or_default();

        if scan.is_clearly_off_domain() {
            tracing::debug!(terms = ?scan.off_domain, "Rejected by off-domain lexicon");
            return GateDecision {
                intent: Intent::OutOfDomain,
                reason: GateReason::Lexicon(scan.off_domain),
                hints: Vec::new(),
                elapsed_ms: start.elapsed().as_millis() as u64,
            };
        }

        let hints = scan.agriculture;
        let result = self
            .retry
            .run("classify", || {
                self.classifier.classify_with_hints(normalized_query, &hints)
            })
            .await;

        let (intent, reason) = match result {
            Ok(Judgment::InDomain) => (Intent::InDomain, GateReason::Classified(Judgment::InDomain)),
            Ok(judgment) => (Intent::OutOfDomain, GateReason::Classified(judgment)),
            Err(e) => {
                tracing::warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Classification failed, defaulting to out of domain"
                );
                metrics::counter!("agri_faq_degraded_total", "stage" => "classification").increment(1);
                (Intent::OutOfDomain, GateReason::ClassifierFailed(e.to_string()))
            }
        };

        tracing::debug!(%intent, reason = ?reason, hints = ?hints, "Intent decided");

        GateDecision {
            intent,
            reason,
            hints,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_faq_core::{Error, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Scripted {
        answer: Result<Judgment>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(answer: Result<Judgment>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IntentClassifier for Scripted {
        async fn classify(&self, _text: &str) -> Result<Judgment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            timeout: Duration::from_secs(1),
        }
    }

    fn gate(classifier: Arc<Scripted>) -> IntentGate {
        IntentGate::new(classifier, retry()).with_lexicon(Arc::new(DomainLexicon::builtin().unwrap()))
    }

    #[tokio::test]
    async fn test_in_domain_judgment_admits() {
        let classifier = Scripted::new(Ok(Judgment::InDomain));
        let decision = gate(classifier.clone()).decide("how to control thrips on chilli").await;

        assert_eq!(decision.intent, Intent::InDomain);
        assert!(!decision.is_degraded());
        assert!(decision.hints.contains(&"thrips".to_string()));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_is_out_of_domain() {
        let classifier = Scripted::new(Ok(Judgment::Unknown));
        let decision = gate(classifier).decide("what is the meaning of life").await;

        assert_eq!(decision.intent, Intent::OutOfDomain);
        assert_eq!(decision.reason, GateReason::Classified(Judgment::Unknown));
        assert!(!decision.is_degraded());
    }

    #[tokio::test]
    async fn test_failure_is_out_of_domain_after_retries() {
        let classifier = Scripted::new(Err(Error::ClassificationUnavailable("down".to_string())));
        let decision = gate(classifier.clone()).decide("how to grow tomato").await;

        assert_eq!(decision.intent, Intent::OutOfDomain);
        assert!(decision.is_degraded());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_lexicon_rejects_without_classifier_call() {
        let classifier = Scripted::new(Ok(Judgment::InDomain));
        let decision = gate(classifier.clone()).decide("Best laptops for gaming in 2024").await;

        assert_eq!(decision.intent, Intent::OutOfDomain);
        assert!(matches!(decision.reason, GateReason::Lexicon(_)));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lexicon_never_admits() {
        // agriculture terms alone still go to the classifier
        let classifier = Scripted::new(Ok(Judgment::OutOfDomain));
        let intent = gate(classifier.clone()).classify_intent("crop loan insurance for farmers").await;

        assert_eq!(intent, Intent::OutOfDomain);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_without_lexicon_always_consults_classifier() {
        let classifier = Scripted::new(Ok(Judgment::OutOfDomain));
        let gate = IntentGate::new(classifier.clone(), retry());
        gate.classify_intent("Best laptops for gaming").await;
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }
}
