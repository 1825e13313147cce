// Vigil Engine — Semantic Retrieval
//
// One scoring law, applied everywhere:
//
//   retrieval_score = 0.7·cosine(query, record) + 0.3·trust(record, now)
//
// Similarity alone is not relevance — an apt-sounding memory with a failed
// outcome, stale age, or weak source is down-weighted by its trust term.
// Ties go to the most recent record.

use chrono::Utc;
use log::info;

use crate::atoms::constants::{RETRIEVAL_SIMILARITY_WEIGHT, RETRIEVAL_TRUST_WEIGHT};
use crate::atoms::error::EngineResult;
use crate::atoms::types::RetrievedMemory;
use crate::engine::providers::Embedder;
use crate::engine::store::{cosine_similarity, MemoryStore};
use crate::engine::trust::trust;

/// Rank the store against a query and return the top_k hits. An empty store
/// yields an empty list, never an error. A failing embedder is a provider
/// error — the caller decides how to degrade.
pub fn retrieve(
    store: &MemoryStore,
    embedder: &dyn Embedder,
    query: &str,
    top_k: usize,
) -> EngineResult<Vec<RetrievedMemory>> {
    let records = store.all()?;
    if records.is_empty() || top_k == 0 {
        return Ok(Vec::new());
    }

    let query_vec = embedder.embed(query)?;
    let now = Utc::now();

    let mut scored: Vec<(RetrievedMemory, String)> = records
        .into_iter()
        .map(|record| {
            let similarity = cosine_similarity(&query_vec, &record.embedding);
            let score = RETRIEVAL_SIMILARITY_WEIGHT * similarity
                + RETRIEVAL_TRUST_WEIGHT * trust(&record, now);
            let created_at = record.created_at.clone();
            (
                RetrievedMemory {
                    content: record.content,
                    score,
                    tier: record.tier,
                },
                created_at,
            )
        })
        .collect();

    // Descending by score; ties go to the most recent record.
    scored.sort_by(|a, b| {
        b.0.score
            .partial_cmp(&a.0.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.1.cmp(&a.1))
    });
    scored.truncate(top_k);

    let preview: String = query.chars().take(60).collect();
    info!("[retrieval] {} hit(s) for '{}'", scored.len(), preview);
    Ok(scored.into_iter().map(|(memory, _)| memory).collect())
}

/// Render retrieval hits as a context block for prompt injection, tagged
/// with each memory's tier.
pub fn context_block(results: &[RetrievedMemory]) -> String {
    results
        .iter()
        .map(|memory| {
            format!(
                "[{} MEMORY - Score: {:.2}] {}",
                memory.tier.as_str().to_uppercase(),
                memory.score,
                memory.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
