// ── Vigil Atoms: Constants ─────────────────────────────────────────────────
// All named constants for the crate live here.
// Collecting them in one place eliminates magic numbers scattered across the
// scoring, gating, and scanning layers, and makes the policy auditable.

// ── Trust scoring weights ──────────────────────────────────────────────────
// trust = outcome·0.5 + decay·0.3 + source credibility·0.2
pub const TRUST_OUTCOME_WEIGHT: f64 = 0.5;
pub const TRUST_DECAY_WEIGHT: f64 = 0.3;
pub const TRUST_SOURCE_WEIGHT: f64 = 0.2;

pub const OUTCOME_SUCCESS_SCORE: f64 = 1.0;
pub const OUTCOME_NEUTRAL_SCORE: f64 = 0.5;
pub const OUTCOME_FAILURE_SCORE: f64 = 0.1;

pub const SOURCE_AUTHORITATIVE_CREDIBILITY: f64 = 1.0;
pub const SOURCE_DEFAULT_CREDIBILITY: f64 = 0.6;

// ── Retention half-lives (hours) ───────────────────────────────────────────
// Strategic knowledge (plans, commitments, long-horizon facts) stays
// influential for a month; tactical execution detail falls out of relevance
// within two days. Decay never drops below the floor.
pub const HALF_LIFE_STRATEGIC_HOURS: f64 = 720.0;
pub const HALF_LIFE_TACTICAL_HOURS: f64 = 48.0;
pub const DECAY_FLOOR: f64 = 0.1;

// ── Tier classification ────────────────────────────────────────────────────
pub const STRATEGIC_CONFIDENCE_MIN: f64 = 0.9;
pub const STRATEGIC_MARKERS: [&str; 4] = ["vision", "strategy", "investor", "plan"];

// ── Retrieval ──────────────────────────────────────────────────────────────
// retrieval_score = similarity·0.7 + trust·0.3 — an apt-sounding but
// untrustworthy memory must rank below a trusted one.
pub const RETRIEVAL_SIMILARITY_WEIGHT: f64 = 0.7;
pub const RETRIEVAL_TRUST_WEIGHT: f64 = 0.3;
pub const DEFAULT_TOP_K: usize = 5;

// ── Scar ledger ────────────────────────────────────────────────────────────
// A scar at or above the veto threshold blocks matching requests outright;
// anything below is informational.
pub const VETO_SEVERITY_MIN: f64 = 0.8;
pub const FEEDBACK_SCAR_SEVERITY: f64 = 0.9;

// ── Guardrail ──────────────────────────────────────────────────────────────
pub const DEFAULT_RISK_CEILING: f64 = 5000.0;
pub const RISK_COST_ACTION: f64 = 100.0;
pub const RISK_COST_BASELINE: f64 = 10.0;
pub const ACTION_VERBS: [&str; 4] = ["decide", "read", "delete", "move"];
pub const SELF_PRESERVATION_PHRASES: [&str; 3] = ["delete", "format", "remove system"];
pub const FORBIDDEN_DIR_NAMES: [&str; 4] = ["System32", "Windows", "AppData", VAULT_DIR_NAME];
// Regret accounting assumes each unit of averted risk × impact maps to this
// much estimated loss.
pub const REGRET_LOSS_PER_UNIT: f64 = 100.0;
pub const REGRET_VETO_IMPACT: f64 = 9.0;

// ── Scanner ────────────────────────────────────────────────────────────────
pub const VAULT_DIR_NAME: &str = ".vigil_vault";
pub const SENSITIVITY_THRESHOLD: u8 = 80;
pub const SCAN_EXCERPT_BYTES: usize = 1000;
pub const SCAN_EXTENSIONS: [&str; 5] = ["txt", "md", "log", "docx", "pdf"];
pub const SCAN_SKIP_DIRS: [&str; 5] = [
    "Windows",
    "Program Files",
    "AppData",
    ".git",
    "node_modules",
];
pub const SCAN_SWEEP_INTERVAL_SECS: u64 = 3600;
// The stop flag is polled at this granularity while the scanner sleeps
// between sweeps, so shutdown takes effect in seconds, not hours.
pub const SCAN_STOP_POLL_SECS: u64 = 1;

// ── Collaborator timeouts (seconds) ────────────────────────────────────────
// Every external call is bounded; a timeout degrades like a parse failure.
pub const EMBED_TIMEOUT_SECS: u64 = 10;
pub const CHAT_TIMEOUT_SECS: u64 = 30;

// ── Interaction feedback confidences ───────────────────────────────────────
pub const CONFIDENCE_SUCCESS: f64 = 0.9;
pub const CONFIDENCE_NEUTRAL: f64 = 0.5;
pub const CONFIDENCE_FAILURE: f64 = 0.2;
