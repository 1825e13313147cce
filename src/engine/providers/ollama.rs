// Vigil Engine — Ollama Client
// Blocking HTTP client for the local Ollama API: embeddings and chat
// completions. Every call carries a short timeout, so a hung endpoint
// degrades like a failed one instead of wedging the caller.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};

use super::{Completer, Embedder};
use crate::atoms::constants::{CHAT_TIMEOUT_SECS, EMBED_TIMEOUT_SECS};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::EngineConfig;

pub struct OllamaClient {
    client: Client,
    base_url: String,
    chat_model: String,
    embed_model: String,
}

impl OllamaClient {
    pub fn new(config: &EngineConfig) -> Self {
        OllamaClient {
            client: Client::new(),
            base_url: config.llm_base_url.trim_end_matches('/').to_string(),
            chat_model: config.llm_model.clone(),
            embed_model: config.embedding_model.clone(),
        }
    }

    /// Whether the endpoint answers at all (used for a startup warning).
    pub fn check_reachable(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    /// Current API: POST /api/embed { model, input } → { embeddings: [[f32…]] }.
    fn embed_current(&self, text: &str) -> EngineResult<Vec<f32>> {
        let resp = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&json!({ "model": self.embed_model, "input": text }))
            .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
            .send()?;
        if !resp.status().is_success() {
            return Err(EngineError::provider(
                "ollama",
                format!("embed returned {}", resp.status()),
            ));
        }
        let v: Value = resp.json()?;

        // { embeddings: [[…]] } — some versions return singular "embedding".
        if let Some(first) = v["embeddings"]
            .as_array()
            .and_then(|e| e.first())
            .and_then(|e| e.as_array())
        {
            let vec = collect_f32(first);
            if !vec.is_empty() {
                return Ok(vec);
            }
        }
        if let Some(embedding) = v["embedding"].as_array() {
            let vec = collect_f32(embedding);
            if !vec.is_empty() {
                return Ok(vec);
            }
        }
        Err(EngineError::provider(
            "ollama",
            "no embedding vector in response",
        ))
    }

    /// Legacy API: POST /api/embeddings { model, prompt } → { embedding: […] }.
    fn embed_legacy(&self, text: &str) -> EngineResult<Vec<f32>> {
        let resp = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&json!({ "model": self.embed_model, "prompt": text }))
            .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
            .send()?;
        if !resp.status().is_success() {
            return Err(EngineError::provider(
                "ollama",
                format!("legacy embed returned {}", resp.status()),
            ));
        }
        let v: Value = resp.json()?;
        let embedding = v["embedding"]
            .as_array()
            .map(|values| collect_f32(values))
            .unwrap_or_default();
        if embedding.is_empty() {
            return Err(EngineError::provider(
                "ollama",
                "empty embedding vector in legacy response",
            ));
        }
        Ok(embedding)
    }
}

fn collect_f32(values: &[Value]) -> Vec<f32> {
    values
        .iter()
        .filter_map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

impl Embedder for OllamaClient {
    /// Tries the current endpoint first, then the legacy one.
    fn embed(&self, text: &str) -> EngineResult<Vec<f32>> {
        match self.embed_current(text) {
            Ok(vec) => Ok(vec),
            Err(first) => self.embed_legacy(text).map_err(|second| {
                EngineError::provider("ollama", format!("embedding failed: {first} | {second}"))
            }),
        }
    }
}

impl Completer for OllamaClient {
    /// Non-streaming chat: POST /api/chat. The reply text is extracted from
    /// message.content; any other shape is a provider error.
    fn complete(&self, prompt: &str) -> EngineResult<String> {
        let resp = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&json!({
                "model": self.chat_model,
                "messages": [{ "role": "user", "content": prompt }],
                "stream": false,
            }))
            .timeout(Duration::from_secs(CHAT_TIMEOUT_SECS))
            .send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(EngineError::provider(
                "ollama",
                format!("chat {status} — {body}"),
            ));
        }
        let v: Value = resp.json()?;
        v["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| EngineError::provider("ollama", "no message content in chat response"))
    }
}
