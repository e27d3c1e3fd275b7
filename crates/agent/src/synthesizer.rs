//! Answer synthesizer
//!
//! | Intent | Retrieval | Classification |
//! |---|---|---|
//! | OUT_OF_DOMAIN | any | OUT_OF_DOMAIN, fixed rejection |
//! | IN_DOMAIN | empty | NO_CONTEXT, fixed unknown message |
//! | IN_DOMAIN | non-empty | GROUNDED, generated from the passages |
//!
//! Generation is retried per the configured policy; on exhaustion the
//! result is a degraded NO_CONTEXT that the cache never stores.

use std::sync::Arc;
use std::time::Instant;

use agri_faq_config::constants::messages;
use agri_faq_core::{
    Generator, Intent, Response, ResponseRecord, RetrievalResult, RetryPolicy, SourceRef, Timing,
};
use agri_faq_llm::PromptBuilder;
use agri_faq_text_processing::DomainLexicon;

pub struct AnswerSynthesizer {
    generator: Arc<dyn Generator>,
    lexicon: Option<Arc<DomainLexicon>>,
    retry: RetryPolicy,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn Generator>, retry: RetryPolicy) -> Self {
        Self {
            generator,
            lexicon: None,
            retry,
        }
    }

    /// Use the lexicon's focus terms to narrow grounded prompts
    pub fn with_lexicon(mut self, lexicon: Arc<DomainLexicon>) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub fn out_of_domain() -> Response {
        Response::OutOfDomain {
            answer: messages::OUT_OF_DOMAIN.to_string(),
        }
    }

    pub fn no_context() -> Response {
        Response::NoContext {
            answer: messages::NO_CONTEXT.to_string(),
        }
    }

    /// Only `generation_ms` is filled in the returned timing
    pub async fn synthesize(
        &self,
        query: &str,
        retrieval: &RetrievalResult,
        intent: Intent,
    ) -> ResponseRecord {
        if !intent.is_in_domain() {
            return ResponseRecord::new(Self::out_of_domain(), Timing::default());
        }
        if retrieval.is_empty() {
            tracing::debug!(
                best_similarity = ?retrieval.best_similarity,
                min_similarity = retrieval.min_similarity,
                "No passage cleared the threshold"
            );
            return ResponseRecord::new(Self::no_context(), Timing::default());
        }

        let start = Instant::now();
        let context = retrieval.texts();
        let focus = self
            .lexicon
            .as_ref()
            .and_then(|lexicon| lexicon.focus_terms(query).into_iter().next());
        let prompt = PromptBuilder::new()
            .with_context(&context)
            .with_focus(focus.as_deref())
            .question(query)
            .build_grounded();

        let result = self
            .retry
            .run("generate", || self.generator.generate(&prompt, &context))
            .await;
        let timing = Timing {
            generation_ms: start.elapsed().as_millis() as u64,
            ..Timing::default()
        };

        match result {
            Ok(answer) => {
                tracing::debug!(
                    model = self.generator.model_name(),
                    passages = context.len(),
                    focus = ?focus,
                    generation_ms = timing.generation_ms,
                    "Grounded answer generated"
                );
                let sources = retrieval
                    .hits
                    .iter()
                    .map(|hit| SourceRef {
                        passage_id: hit.passage.id.clone(),
                        section: hit.passage.section.clone(),
                        similarity: hit.similarity,
                    })
                    .collect();
                ResponseRecord::new(Response::Grounded { answer, sources }, timing)
            }
            Err(e) => {
                tracing::warn!(
                    model = self.generator.model_name(),
                    error = %e,
                    "Generation failed, answering without context"
                );
                metrics::counter!("agri_faq_degraded_total", "stage" => "generation").increment(1);
                ResponseRecord::degraded(Self::no_context(), timing)
            }
        }
    }
}
