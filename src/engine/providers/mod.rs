// Vigil Engine — Collaborator Contracts
// External services live behind traits so the engine and its tests never
// depend on a live endpoint. Calls are synchronous and blocking; a slow or
// hung collaborator stalls only the calling loop.

pub mod ollama;

pub use ollama::OllamaClient;

use crate::atoms::error::EngineResult;

/// Text → fixed-length vector. Deterministic for the same input within a
/// session; the dimensionality is fixed for the lifetime of a store —
/// mixing dimensionalities across records breaks similarity comparison.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> EngineResult<Vec<f32>>;
}

/// Prompt → free-text completion. Replies are untrusted external input:
/// callers extract the first parseable signal and degrade on failure.
pub trait Completer: Send + Sync {
    fn complete(&self, prompt: &str) -> EngineResult<String>;
}
