//! Core traits and types for the agricultural FAQ query core
//!
//! This crate provides foundational types used across all other crates:
//! - Corpus passages and retrieval results
//! - The classified response record (the cache payload)
//! - Intent and external judgment types
//! - Collaborator traits for embedding, classification and generation
//! - Error taxonomy and the bounded retry policy

pub mod error;
pub mod intent;
pub mod passage;
pub mod response;
pub mod retry;
pub mod traits;

pub use error::{Error, Result};
pub use intent::{Intent, Judgment};
pub use passage::{Passage, RetrievalResult, ScoredPassage};
pub use response::{Classification, Response, ResponseRecord, SourceRef, Timing};
pub use retry::RetryPolicy;

pub use traits::{Embedder, Generator, IntentClassifier};
