// ── Vigil Atoms: Data Types ────────────────────────────────────────────────
// Plain data carried between the store, the scorers, the gates, and the
// scanner. Everything here is inert — behavior lives in engine/.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ── Provenance ─────────────────────────────────────────────────────────────

/// Where a memory came from. Credibility weighting keys off this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Admin,
    Executive,
    Interactive,
    Scanner,
    SystemLog,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Admin => "admin",
            Source::Executive => "executive",
            Source::Interactive => "interactive",
            Source::Scanner => "scanner",
            Source::SystemLog => "system_log",
        }
    }

    /// Parse a stored tag. Unknown text maps to Interactive, which scores as
    /// non-authoritative.
    pub fn parse(s: &str) -> Source {
        match s.trim().to_lowercase().as_str() {
            "admin" => Source::Admin,
            "executive" => Source::Executive,
            "scanner" => Source::Scanner,
            "system_log" => Source::SystemLog,
            _ => Source::Interactive,
        }
    }

    /// Authoritative actors: administrators, executives, and the scanner's
    /// own automated security actions.
    pub fn is_authoritative(&self) -> bool {
        matches!(self, Source::Admin | Source::Executive | Source::Scanner)
    }
}

// ── Outcome ────────────────────────────────────────────────────────────────

/// How the observed interaction or decision turned out. Unknown at creation
/// time is legal and may be back-filled once via the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Neutral,
    Failure,
    Unknown,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Neutral => "neutral",
            Outcome::Failure => "failure",
            Outcome::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Outcome {
        match s.trim().to_lowercase().as_str() {
            "success" => Outcome::Success,
            "neutral" => Outcome::Neutral,
            "failure" => Outcome::Failure,
            _ => Outcome::Unknown,
        }
    }
}

// ── Tier ───────────────────────────────────────────────────────────────────

/// Retention class, fixed at record creation. Strategic memories decay over
/// a month; tactical ones over two days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Tactical,
    Strategic,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Tactical => "tactical",
            Tier::Strategic => "strategic",
        }
    }

    pub fn parse(s: &str) -> Tier {
        match s.trim().to_lowercase().as_str() {
            "strategic" => Tier::Strategic,
            _ => Tier::Tactical,
        }
    }
}

// ── Memory records ─────────────────────────────────────────────────────────

/// An immutable episodic fact. Trust is derived at query time from outcome,
/// age, tier, and source — it is never stored on the record.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryRecord {
    pub id: String,
    pub content: String,
    pub source: Source,
    pub outcome: Outcome,
    pub confidence: f64,
    pub tier: Tier,
    #[serde(skip_serializing)]
    pub embedding: Vec<f32>,
    pub created_at: String,
}

/// Input to `MemoryStore::append` — the id, tier, and UTC timestamp are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub content: String,
    pub source: Source,
    pub outcome: Outcome,
    pub confidence: f64,
    pub embedding: Vec<f32>,
}

impl NewMemory {
    pub fn new(content: impl Into<String>, source: Source, outcome: Outcome, confidence: f64) -> Self {
        NewMemory {
            content: content.into(),
            source,
            outcome,
            confidence: confidence.clamp(0.0, 1.0),
            embedding: Vec::new(),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

/// One retrieval hit: content plus the combined similarity×trust score,
/// tagged with the tier for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedMemory {
    pub content: String,
    pub score: f64,
    pub tier: Tier,
}

/// Store totals for the status report.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_memories: i64,
    pub avg_confidence: f64,
    pub processed_files: i64,
}

// ── Scars ──────────────────────────────────────────────────────────────────

/// A permanent lesson from a failed decision. The pattern key fingerprints
/// the triggering input; matching runs on the lesson text.
#[derive(Debug, Clone, Serialize)]
pub struct Scar {
    pub pattern_key: String,
    pub severity: f64,
    pub lesson: String,
    pub created_at: String,
}

// ── Scanner ────────────────────────────────────────────────────────────────

/// Classifier reply for one file, before thresholding. Unreadable is distinct
/// from a genuine zero score, but both fail open to "not sensitive".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitivityVerdict {
    Scored(u8),
    Unreadable,
}

impl SensitivityVerdict {
    pub fn effective_score(&self) -> u8 {
        match self {
            SensitivityVerdict::Scored(score) => *score,
            SensitivityVerdict::Unreadable => 0,
        }
    }
}

/// Terminal state for one file in a scan sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Content hash unchanged since the last visit — nothing written.
    SkippedUnchanged,
    /// Classified below the threshold; only the hash cursor was updated.
    Cleared { score: u8 },
    /// Moved into the vault and recorded as a security-action memory.
    Quarantined { score: u8, vault_path: PathBuf },
    /// Quarantine was warranted but the guardrail refused it; the cursor is
    /// left untouched so the file is reconsidered next sweep.
    Deferred { reason: String },
}

// ── Decisions ──────────────────────────────────────────────────────────────

/// One candidate in a decide/compare request. Parsed from an untrusted model
/// reply: unknown fields are rejected, every parameter must be numeric.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionOption {
    pub name: String,
    pub impact: f64,
    pub certainty: f64,
    pub reversibility: f64,
    pub risk: f64,
    pub capital: f64,
    #[serde(rename = "time")]
    pub time_cost: f64,
    #[serde(default = "default_penalty")]
    pub penalty: f64,
}

fn default_penalty() -> f64 {
    1.0
}

/// A scored option in ranked order; the top entry is the recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct RankedOption {
    pub name: String,
    pub score: f64,
    pub scar_count: i64,
    pub recommended: bool,
}

// ── Guardrail ──────────────────────────────────────────────────────────────

/// Outcome of a guardrail consultation. A refusal is a value with a reason,
/// never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed { reason: String },
    Denied { reason: String },
}

impl Verdict {
    pub fn allowed(&self) -> bool {
        matches!(self, Verdict::Allowed { .. })
    }

    pub fn reason(&self) -> &str {
        match self {
            Verdict::Allowed { reason } | Verdict::Denied { reason } => reason,
        }
    }
}

/// Snapshot of the budget and regret accounting for the status report.
#[derive(Debug, Clone, Serialize)]
pub struct GateReport {
    pub budget_spent: f64,
    pub budget_ceiling: f64,
    pub vetoes: u64,
    pub risk_avoided: f64,
    pub loss_saved: f64,
}

// ── Feedback ───────────────────────────────────────────────────────────────

/// Operator feedback after a turn. Failure carries the lesson that becomes a
/// scar.
#[derive(Debug, Clone)]
pub enum Feedback {
    Success,
    Neutral,
    Failure { lesson: String },
}

// ── Configuration ──────────────────────────────────────────────────────────

/// Engine configuration: collaborator endpoints and scan policy. Persisted
/// as JSON in the engine_config table; absent or malformed config falls back
/// to these defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the local model server (Ollama: http://localhost:11434).
    pub llm_base_url: String,
    /// Chat/classification model name.
    pub llm_model: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Directories the scanner sweeps. Empty means the per-user default.
    pub scan_roots: Vec<PathBuf>,
    pub scan_interval_secs: u64,
    pub sensitivity_threshold: u8,
    pub risk_ceiling: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            llm_base_url: "http://localhost:11434".into(),
            llm_model: "llama3".into(),
            embedding_model: "nomic-embed-text".into(),
            scan_roots: Vec::new(),
            scan_interval_secs: crate::atoms::constants::SCAN_SWEEP_INTERVAL_SECS,
            sensitivity_threshold: crate::atoms::constants::SENSITIVITY_THRESHOLD,
            risk_ceiling: crate::atoms::constants::DEFAULT_RISK_CEILING,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_parse_roundtrip() {
        for source in [
            Source::Admin,
            Source::Executive,
            Source::Interactive,
            Source::Scanner,
            Source::SystemLog,
        ] {
            assert_eq!(Source::parse(source.as_str()), source);
        }
    }

    #[test]
    fn unknown_source_is_interactive() {
        assert_eq!(Source::parse("carrier_pigeon"), Source::Interactive);
        assert!(!Source::parse("carrier_pigeon").is_authoritative());
    }

    #[test]
    fn scanner_is_authoritative() {
        assert!(Source::Scanner.is_authoritative());
        assert!(!Source::Interactive.is_authoritative());
    }

    #[test]
    fn outcome_parse_defaults_to_unknown() {
        assert_eq!(Outcome::parse("success"), Outcome::Success);
        assert_eq!(Outcome::parse("FAILURE"), Outcome::Failure);
        assert_eq!(Outcome::parse("garbled"), Outcome::Unknown);
    }

    #[test]
    fn tier_parse_defaults_to_tactical() {
        assert_eq!(Tier::parse("strategic"), Tier::Strategic);
        assert_eq!(Tier::parse("anything else"), Tier::Tactical);
    }

    #[test]
    fn new_memory_clamps_confidence() {
        let memory = NewMemory::new("x", Source::Interactive, Outcome::Neutral, 1.7);
        assert_eq!(memory.confidence, 1.0);
        let memory = NewMemory::new("x", Source::Interactive, Outcome::Neutral, -0.3);
        assert_eq!(memory.confidence, 0.0);
    }

    #[test]
    fn unreadable_verdict_fails_open() {
        assert_eq!(SensitivityVerdict::Unreadable.effective_score(), 0);
        assert_eq!(SensitivityVerdict::Scored(85).effective_score(), 85);
    }
}
