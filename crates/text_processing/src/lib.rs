//! Query text processing
//!
//! - **Term correction**: rewrite misspelled or mis-transcribed domain terms
//!   to their canonical form ([`TermNormalizer`])
//! - **Cache keys**: surface-insensitive lookup keys ([`cache_key`])
//! - **Domain lexicon**: agriculture / off-domain term detection and the
//!   focus terms used to narrow grounded prompts ([`DomainLexicon`])

mod error;
pub mod lexicon;
pub mod normalizer;
mod pattern;

pub use error::{Result, TextProcessingError};
pub use lexicon::{DomainLexicon, LexiconScan};
pub use normalizer::{cache_key, Correction, TermNormalizer};
