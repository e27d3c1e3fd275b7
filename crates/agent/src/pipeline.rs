//! Uncached query pipeline: intent gate → retrieval → synthesis

use std::sync::Arc;
use std::time::Instant;

use agri_faq_config::constants::messages;
use agri_faq_core::{
    Embedder, Error, Response, ResponseRecord, Result, RetrievalResult, RetryPolicy, Timing,
};
use agri_faq_rag::Retriever;

use crate::intent_gate::IntentGate;
use crate::synthesizer::AnswerSynthesizer;

pub struct QueryPipeline {
    gate: IntentGate,
    embedder: Arc<dyn Embedder>,
    retriever: Arc<Retriever>,
    synthesizer: AnswerSynthesizer,
    embedding_retry: RetryPolicy,
}

impl QueryPipeline {
    pub fn new(
        gate: IntentGate,
        embedder: Arc<dyn Embedder>,
        retriever: Arc<Retriever>,
        synthesizer: AnswerSynthesizer,
        embedding_retry: RetryPolicy,
    ) -> Self {
        Self {
            gate,
            embedder,
            retriever,
            synthesizer,
            embedding_retry,
        }
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Process one normalized query
    ///
    /// Collaborator failures degrade into a classified response. Only an
    /// index/embedding dimension mismatch is returned as an error.
    pub async fn run(&self, normalized_query: &str) -> Result<ResponseRecord> {
        let start = Instant::now();
        let mut timing = Timing::default();

        let decision = self.gate.decide(normalized_query).await;
        timing.intent_ms = decision.elapsed_ms;

        let retrieval = if decision.intent.is_in_domain() {
            let retrieval_start = Instant::now();
            let result = self.retrieve(normalized_query).await;
            timing.retrieval_ms = retrieval_start.elapsed().as_millis() as u64;

            match result {
                Ok(retrieval) => retrieval,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        embedder = self.embedder.name(),
                        error = %e,
                        "Embedding unavailable, returning service-unavailable response"
                    );
                    metrics::counter!("agri_faq_degraded_total", "stage" => "embedding").increment(1);
                    timing.total_ms = start.elapsed().as_millis() as u64;
                    return Ok(ResponseRecord::degraded(
                        Response::Unavailable {
                            answer: messages::UNAVAILABLE.to_string(),
                        },
                        timing,
                    ));
                }
            }
        } else {
            RetrievalResult::empty(self.retriever.config().min_similarity)
        };

        let record = self
            .synthesizer
            .synthesize(normalized_query, &retrieval, decision.intent)
            .await;

        timing.generation_ms = record.timing.generation_ms;
        timing.total_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            classification = %record.classification(),
            hits = retrieval.len(),
            intent_ms = timing.intent_ms,
            retrieval_ms = timing.retrieval_ms,
            generation_ms = timing.generation_ms,
            "Pipeline complete"
        );

        Ok(ResponseRecord {
            timing,
            degraded: record.degraded || decision.is_degraded(),
            ..record
        })
    }

    async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let embedding = self
            .embedding_retry
            .run("embed", || self.embedder.embed(query))
            .await?;

        self.retriever.retrieve(&embedding).map_err(Error::from)
    }
}
