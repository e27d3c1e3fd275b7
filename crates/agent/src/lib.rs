//! Query-processing core
//!
//! Features:
//! - Intent gate with a conservative default and an off-domain lexicon pre-filter
//! - Answer synthesizer over three terminal classifications
//! - Two-tier response cache (moka L1, JSON file L2)
//! - Cache manager with per-key single flight, invalidation and priming

pub mod cache;
pub mod cache_manager;
pub mod intent_gate;
pub mod pipeline;
pub mod synthesizer;

pub use cache::{CacheEntry, CacheTier, TieredCache, TieredCacheConfig};
pub use cache_manager::{
    load_prime_queries, CacheManager, CacheStats, CacheStatus, PrimeReport, QueryResponse,
};
pub use intent_gate::{GateDecision, GateReason, IntentGate};
pub use pipeline::QueryPipeline;
pub use synthesizer::AnswerSynthesizer;
