//! Collaborator traits consumed by the query core
//!
//! Network providers (embedding, classification, generation) sit behind
//! these traits so the pipeline can be driven by local implementations in
//! tests and by HTTP backends in production.

mod classifier;
mod embedding;
mod generator;

pub use classifier::IntentClassifier;
pub use embedding::Embedder;
pub use generator::Generator;
