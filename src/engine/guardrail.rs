// Vigil Engine — Guardrail & Risk Budget
//
// The constitution consulted before any state-changing action:
//   1. self-preservation screen — destructive-to-self phrases are refused
//   2. forbidden-path screen   — the vault and core OS directories are
//      off-limits regardless of budget state
//   3. risk budget             — a cumulative counter bounded by a ceiling,
//      charged on approval only, never refunded within a session
//
// Refusals are Verdict values with human-readable reasons, not errors. The
// budget and regret counters live on this explicit state object — there is
// no module-level global, so tests get per-instance isolation.

use log::warn;
use serde::Serialize;

use crate::atoms::constants::{
    ACTION_VERBS, FORBIDDEN_DIR_NAMES, REGRET_LOSS_PER_UNIT, REGRET_VETO_IMPACT,
    RISK_COST_ACTION, RISK_COST_BASELINE, SELF_PRESERVATION_PHRASES,
};
use crate::atoms::types::{GateReport, Verdict};

// ── Risk budget ────────────────────────────────────────────────────────────

/// Cumulative risk spend, bounded by a ceiling. Monotonic within a session:
/// approval charges it, denial leaves it untouched, nothing refunds it.
#[derive(Debug)]
pub struct RiskBudget {
    spent: f64,
    ceiling: f64,
}

impl RiskBudget {
    pub fn new(ceiling: f64) -> Self {
        RiskBudget { spent: 0.0, ceiling }
    }

    pub fn spent(&self) -> f64 {
        self.spent
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    fn try_charge(&mut self, cost: f64) -> bool {
        if self.spent + cost > self.ceiling {
            return false;
        }
        self.spent += cost;
        true
    }
}

// ── Regret index ───────────────────────────────────────────────────────────

/// Running account of what the gates refused: how often, how much estimated
/// risk was avoided, and the loss that maps to.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegretIndex {
    pub vetoes: u64,
    pub risk_avoided: f64,
    pub loss_saved: f64,
}

impl RegretIndex {
    fn record(&mut self, risk: f64) {
        self.vetoes += 1;
        self.risk_avoided += risk;
        self.loss_saved += risk * REGRET_VETO_IMPACT * REGRET_LOSS_PER_UNIT;
    }
}

// ── Guardrail ──────────────────────────────────────────────────────────────

pub struct Guardrail {
    forbidden_dirs: Vec<String>,
    budget: RiskBudget,
    regret: RegretIndex,
}

impl Guardrail {
    pub fn new(ceiling: f64) -> Self {
        Guardrail {
            forbidden_dirs: FORBIDDEN_DIR_NAMES
                .iter()
                .map(|name| name.to_lowercase())
                .collect(),
            budget: RiskBudget::new(ceiling),
            regret: RegretIndex::default(),
        }
    }

    /// Full consultation for a state-changing action: both screens, then the
    /// budget charge. This is the single entry point used by the scanner and
    /// by generic action paths.
    pub fn consult(&mut self, action: &str, risk_cost: f64) -> Verdict {
        match self.screen(action) {
            Verdict::Allowed { .. } => self.charge(action, risk_cost),
            denied => denied,
        }
    }

    /// Constitution screens only (no budget charge): self-preservation and
    /// forbidden paths.
    pub fn screen(&mut self, action: &str) -> Verdict {
        let action_lower = action.to_lowercase();

        if SELF_PRESERVATION_PHRASES
            .iter()
            .any(|phrase| action_lower.contains(phrase))
        {
            self.regret.record(RISK_COST_BASELINE);
            warn!("[guardrail] Self-preservation veto: {}", action);
            return Verdict::Denied {
                reason: "CONSTITUTIONAL BREACH: this action violates the self-preservation \
                         principle and is refused."
                    .into(),
            };
        }

        if let Some(dir) = self
            .forbidden_dirs
            .iter()
            .find(|dir| action_lower.contains(dir.as_str()))
        {
            self.regret.record(RISK_COST_BASELINE);
            warn!("[guardrail] Forbidden path '{}' referenced: {}", dir, action);
            return Verdict::Denied {
                reason: "CONSTITUTIONAL VETO: access to a restricted directory is denied.".into(),
            };
        }

        Verdict::Allowed {
            reason: "constitutional clearance granted".into(),
        }
    }

    /// Budget check alone. Charges the counter on approval; a denial leaves
    /// it untouched.
    pub fn charge(&mut self, action: &str, risk_cost: f64) -> Verdict {
        if !self.budget.try_charge(risk_cost) {
            self.regret.record(risk_cost);
            warn!(
                "[guardrail] Budget veto ({:.0} spent of {:.0}): {}",
                self.budget.spent(),
                self.budget.ceiling(),
                action
            );
            return Verdict::Denied {
                reason: format!(
                    "BUDGET VETO: estimated risk cost {:.0} exceeds the remaining damage \
                     budget ({:.0} of {:.0} already taken). System locked for safety.",
                    risk_cost,
                    self.budget.spent(),
                    self.budget.ceiling()
                ),
            };
        }
        Verdict::Allowed {
            reason: "within damage budget".into(),
        }
    }

    /// Snapshot for the status report.
    pub fn report(&self) -> GateReport {
        GateReport {
            budget_spent: self.budget.spent(),
            budget_ceiling: self.budget.ceiling(),
            vetoes: self.regret.vetoes,
            risk_avoided: self.regret.risk_avoided,
            loss_saved: self.regret.loss_saved,
        }
    }
}

/// Estimated risk cost of a request: action verbs carry real weight,
/// everything else a baseline.
pub fn estimate_risk_cost(input: &str) -> f64 {
    let lower = input.to_lowercase();
    if ACTION_VERBS.iter().any(|verb| lower.contains(verb)) {
        RISK_COST_ACTION
    } else {
        RISK_COST_BASELINE
    }
}
