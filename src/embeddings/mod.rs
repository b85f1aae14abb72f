// Embeddings module
// Chunking of section text and the embedding backend that turns chunks into
// fixed-length vectors

pub mod chunking;
pub mod ollama;

pub use chunking::{reconstruct, split_text};
pub use ollama::OllamaClient;

use crate::Result;

/// An opaque `embed(text) -> vector` capability.
///
/// The pipeline only depends on this trait, never on a concrete backend, so
/// tests can inject a deterministic stub. Implementations must be
/// deterministic for the same text and model, and must truncate long inputs
/// silently rather than fail.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
