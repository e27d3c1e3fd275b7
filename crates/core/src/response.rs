//! Classified response record
//!
//! A `ResponseRecord` is the outcome of processing one query and the payload
//! stored in every cache tier.

use serde::{Deserialize, Serialize};

/// Classification tag of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Grounded,
    NoContext,
    OutOfDomain,
    Unavailable,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Grounded => "GROUNDED",
            Classification::NoContext => "NO_CONTEXT",
            Classification::OutOfDomain => "OUT_OF_DOMAIN",
            Classification::Unavailable => "UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a passage that grounded an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub passage_id: String,
    pub section: String,
    pub similarity: f32,
}

/// Tagged response variant; each tag carries only its valid fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "classification", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// Answer generated from retrieved passages
    Grounded {
        answer: String,
        sources: Vec<SourceRef>,
    },
    /// In-domain query with no relevant passage
    NoContext { answer: String },
    /// Query outside the agricultural domain
    OutOfDomain { answer: String },
    /// External services could not be reached
    Unavailable { answer: String },
}

impl Response {
    pub fn classification(&self) -> Classification {
        match self {
            Response::Grounded { .. } => Classification::Grounded,
            Response::NoContext { .. } => Classification::NoContext,
            Response::OutOfDomain { .. } => Classification::OutOfDomain,
            Response::Unavailable { .. } => Classification::Unavailable,
        }
    }

    pub fn answer(&self) -> &str {
        match self {
            Response::Grounded { answer, .. }
            | Response::NoContext { answer }
            | Response::OutOfDomain { answer }
            | Response::Unavailable { answer } => answer,
        }
    }
}

/// Per-stage timings in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub intent_ms: u64,
    pub retrieval_ms: u64,
    pub generation_ms: u64,
    pub total_ms: u64,
}

/// Outcome of processing one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(flatten)]
    pub response: Response,
    pub timing: Timing,
    /// Produced by a fallback path; never committed to the cache
    #[serde(default)]
    pub degraded: bool,
}

impl ResponseRecord {
    pub fn new(response: Response, timing: Timing) -> Self {
        Self {
            response,
            timing,
            degraded: false,
        }
    }

    pub fn degraded(response: Response, timing: Timing) -> Self {
        Self {
            response,
            timing,
            degraded: true,
        }
    }

    pub fn classification(&self) -> Classification {
        self.response.classification()
    }

    pub fn answer(&self) -> &str {
        self.response.answer()
    }

    /// Whether this record may be stored in the cache
    pub fn is_cacheable(&self) -> bool {
        !self.degraded
    }
}
