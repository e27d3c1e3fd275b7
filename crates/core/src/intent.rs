//! Query intent types

use serde::{Deserialize, Serialize};

/// Decision of the intent gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    InDomain,
    OutOfDomain,
}

impl Intent {
    pub fn is_in_domain(self) -> bool {
        matches!(self, Intent::InDomain)
    }
}

/// Raw judgment returned by an external classifier
///
/// `Unknown` covers ambiguous or unparseable answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Judgment {
    InDomain,
    OutOfDomain,
    Unknown,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::InDomain => write!(f, "IN_DOMAIN"),
            Intent::OutOfDomain => write!(f, "OUT_OF_DOMAIN"),
        }
    }
}
