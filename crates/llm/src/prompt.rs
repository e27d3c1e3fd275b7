//! Prompt Building
//!
//! Constructs the grounded-answer and intent-classification prompts sent to
//! the generation backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// System instruction for grounded answers
pub const GROUNDED_SYSTEM_PROMPT: &str = "You are an agricultural advisor answering farmer questions. \
Use only the facts stated in the supplied context. Do not add dosages, products, crops or claims that \
the context does not contain. If the context does not answer the question, say that you don't know. \
Answer in plain language in at most three sentences.";

/// System instruction for intent classification
pub const CLASSIFIER_SYSTEM_PROMPT: &str = "You label questions for an agricultural help line. \
Reply with exactly one word: AGRICULTURE if the question is about crops, farming, soil, pests, plant \
diseases, fertilizers or agricultural products, otherwise NON_AGRICULTURE.";

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Prompt builder
///
/// ```ignore
/// let prompt = PromptBuilder::new()
///     .with_context(&passages)
///     .with_focus(Some("thrips"))
///     .question("How do I control thrips on chilli?")
///     .build_grounded();
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    context: Vec<String>,
    focus: Option<String>,
    question: String,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Passage texts, in rank order
    pub fn with_context(mut self, passages: &[String]) -> Self {
        self.context = passages
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Restrict the answer to one named disease, pest or product
    pub fn with_focus(mut self, term: Option<&str>) -> Self {
        self.focus = term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    pub fn question(mut self, question: &str) -> Self {
        self.question = question.trim().to_string();
        self
    }

    fn context_block(&self) -> String {
        self.context.join("\n\n")
    }

    /// User prompt for a grounded answer
    pub fn build_grounded(&self) -> String {
        let context = self.context_block();
        match &self.focus {
            Some(term) => {
                let term = term.to_uppercase();
                format!(
                    "Based on this context, answer ONLY about {term}. Ignore other diseases, pests \
                     or products mentioned.\n\nContext:\n{context}\n\nQuestion: {question}\n\n\
                     Answer about {term} only:",
                    term = term,
                    context = context,
                    question = self.question,
                )
            }
            None => format!(
                "Answer based ONLY on this context:\n{}\n\nQ: {}\nA:",
                context, self.question
            ),
        }
    }

    /// Chat messages for a grounded answer
    pub fn build_messages(&self) -> Vec<Message> {
        vec![
            Message::system(GROUNDED_SYSTEM_PROMPT),
            Message::user(self.build_grounded()),
        ]
    }

    /// Classification prompt with optional domain-term hints
    pub fn classification(question: &str, hints: &[String]) -> String {
        let mut prompt = format!("Classify as AGRICULTURE or NON_AGRICULTURE: {}", question.trim());
        if !hints.is_empty() {
            prompt.push_str(&format!("\nAgricultural terms found: {}", hints.join(", ")));
        }
        prompt
    }

    pub fn classification_messages(question: &str, hints: &[String]) -> Vec<Message> {
        vec![
            Message::system(CLASSIFIER_SYSTEM_PROMPT),
            Message::user(Self::classification(question, hints)),
        ]
    }
}
