// ── Vigil Atoms: Error Types ───────────────────────────────────────────────
// Single canonical error enum for the engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, DB, Network, Provider…).
//   • The `#[from]` attribute wires std/external error conversions.
//   • Policy refusals (guardrail denial, scar veto) are NOT errors — they are
//     ordinary Ok values carrying a human-readable reason.
//   • Input validation failures reject before any side effect.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// SQLite / rusqlite database failure.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Collaborator (embedding / reasoning service) failure.
    #[error("Provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    /// Malformed input rejected before any side effect.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Other(String),
}

// ── Convenience constructors ───────────────────────────────────────────────

impl EngineError {
    /// Create a provider error with name and message.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All engine operations return this type.
pub type EngineResult<T> = Result<T, EngineError>;
