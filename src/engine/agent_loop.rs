// Vigil Engine — Foreground Request Path
//
// Gate order for every request:
//   1. scar veto      — a severe past failure textually matching the input
//   2. risk budget    — cumulative damage accounting
//   3. built-in commands (forget / decide / status)
//   4. constitution screen, then context retrieval + completion
//
// Feedback after a turn writes the interaction back as a memory; negative
// feedback also registers a scar so the same path is vetoed next time.
// Collaborator failures degrade to a local reply — they never crash the loop.

use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;

use crate::atoms::constants::{
    CONFIDENCE_FAILURE, CONFIDENCE_NEUTRAL, CONFIDENCE_SUCCESS, DEFAULT_TOP_K,
    FEEDBACK_SCAR_SEVERITY, VETO_SEVERITY_MIN,
};
use crate::atoms::error::EngineResult;
use crate::atoms::types::{Feedback, NewMemory, Outcome, Source, Verdict};
use crate::engine::decision::{format_ranking, parse_options, rank_options};
use crate::engine::guardrail::{estimate_risk_cost, Guardrail};
use crate::engine::providers::{Completer, Embedder};
use crate::engine::retrieval::{context_block, retrieve};
use crate::engine::store::MemoryStore;

pub struct Engine {
    store: Arc<MemoryStore>,
    guardrail: Arc<Mutex<Guardrail>>,
    embedder: Arc<dyn Embedder>,
    completer: Arc<dyn Completer>,
}

impl Engine {
    pub fn new(
        store: Arc<MemoryStore>,
        guardrail: Arc<Mutex<Guardrail>>,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
    ) -> Self {
        Engine {
            store,
            guardrail,
            embedder,
            completer,
        }
    }

    /// Handle one operator request. Refusals (veto, budget, constitution)
    /// come back as ordinary replies with a reason — never as errors.
    pub fn handle_request(&self, input: &str) -> EngineResult<String> {
        // 1. Scar veto. At or above the threshold the request is refused
        //    outright; below it the match is informational.
        if let Some(scar) = self.store.check_trauma(input)? {
            if scar.severity >= VETO_SEVERITY_MIN {
                return Ok(format!(
                    "STRATEGIC VETO: this request matches a previous critical failure \
                     (severity {:.2}). Lesson: {}. Manual override clearance is required \
                     before I will execute it.",
                    scar.severity, scar.lesson
                ));
            }
            info!("[engine] Caution — input matches a past lesson: {}", scar.lesson);
        }

        // 2. Risk budget.
        let cost = estimate_risk_cost(input);
        if let Verdict::Denied { reason } = self.guardrail.lock().charge(input, cost) {
            return Ok(reason);
        }

        let input_lower = input.to_lowercase();

        // 3. Built-in commands.
        if let Some(keyword) = parse_forget_command(&input_lower) {
            let removed = self.store.delete_matching(&keyword)?;
            return Ok(if removed > 0 {
                format!("Understood. Wiped {} stored memories related to '{}'.", removed, keyword)
            } else {
                format!("No memories matched '{}'.", keyword)
            });
        }

        if input_lower.contains("decide") || input_lower.contains("compare") {
            return self.handle_decision(input);
        }

        if matches!(input_lower.trim(), "report" | "status" | "health") {
            return self.status_report();
        }

        // 4. Constitution screen, then reasoning with recalled context.
        if let Verdict::Denied { reason } = self.guardrail.lock().screen(input) {
            return Ok(reason);
        }

        let context = match retrieve(&self.store, self.embedder.as_ref(), input, DEFAULT_TOP_K) {
            Ok(hits) => context_block(&hits),
            Err(e) => {
                warn!("[engine] Retrieval unavailable — continuing without context: {}", e);
                String::new()
            }
        };

        let prompt = build_prompt(input, &context);
        match self.completer.complete(&prompt) {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!("[engine] Completion failed — degrading to local reply: {}", e);
                Ok(offline_reply(&context))
            }
        }
    }

    /// Decide/compare path: ask the collaborator to extract per-option
    /// parameters, then rank with the scar-weighted formula. Parser and
    /// collaborator failures degrade to an explanatory reply.
    fn handle_decision(&self, input: &str) -> EngineResult<String> {
        let parser_prompt = format!(
            "Act as a strategic analyst. Extract decision parameters for each option \
             in this text: \"{}\"\n\
             Return ONLY a raw JSON list of objects without backticks or extra text:\n\
             [{{\"name\": \"Option Name\", \"impact\": 1-10, \"certainty\": 0.1-1.0, \
             \"reversibility\": 0.1-1.0, \"risk\": 1-10, \"capital\": 1-10, \
             \"time\": 1-10, \"penalty\": 1.0}}]",
            input
        );

        let reply = match self.completer.complete(&parser_prompt) {
            Ok(reply) => reply,
            Err(e) => return Ok(format!("Decision parser unavailable: {}", e)),
        };

        match parse_options(&reply).and_then(|options| rank_options(&self.store, &options)) {
            Ok(ranked) => Ok(format_ranking(&ranked)),
            Err(e) => Ok(format!("Decision parser error: {}", e)),
        }
    }

    /// Write the turn back into institutional memory. Failure feedback also
    /// records a scar with the operator's lesson.
    pub fn record_feedback(
        &self,
        input: &str,
        reply: &str,
        feedback: Feedback,
    ) -> EngineResult<String> {
        let (outcome, confidence) = match &feedback {
            Feedback::Success => (Outcome::Success, CONFIDENCE_SUCCESS),
            Feedback::Neutral => (Outcome::Neutral, CONFIDENCE_NEUTRAL),
            Feedback::Failure { .. } => (Outcome::Failure, CONFIDENCE_FAILURE),
        };

        if let Feedback::Failure { lesson } = &feedback {
            self.store
                .register_scar(input, FEEDBACK_SCAR_SEVERITY, lesson)?;
        }

        let content = format!("User: {} | Agent: {}", input, reply);
        let embedding = match self.embedder.embed(&content) {
            Ok(vec) => vec,
            Err(e) => {
                warn!("[engine] Embedding failed — storing memory without vector: {}", e);
                Vec::new()
            }
        };

        self.store.append(
            NewMemory::new(content, Source::Interactive, outcome, confidence)
                .with_embedding(embedding),
        )
    }

    /// Snapshot of the store, budget, and regret accounting.
    pub fn status_report(&self) -> EngineResult<String> {
        let stats = self.store.stats()?;
        let gate = self.guardrail.lock().report();
        Ok(format!(
            "VIGIL STATUS REPORT\n\
             -------------------\n\
             Institutional memories: {}\n\
             Average confidence:     {:.2}\n\
             Files processed:        {}\n\
             Risk budget:            {:.0} / {:.0}\n\
             Vetoes issued:          {} (est. loss saved: {:.0})",
            stats.total_memories,
            stats.avg_confidence,
            stats.processed_files,
            gate.budget_spent,
            gate.budget_ceiling,
            gate.vetoes,
            gate.loss_saved
        ))
    }
}

fn parse_forget_command(input_lower: &str) -> Option<String> {
    for prefix in ["forget about", "delete memory"] {
        if let Some(pos) = input_lower.find(prefix) {
            let keyword = input_lower[pos + prefix.len()..].trim().to_string();
            if !keyword.is_empty() {
                return Some(keyword);
            }
        }
    }
    None
}

fn build_prompt(input: &str, context: &str) -> String {
    format!(
        "You are the reasoning core of a local assistant with institutional memory.\n\
         INSTITUTIONAL MEMORY (most credible first):\n{}\n\n\
         USER REQUEST: {}",
        if context.is_empty() { "(none)" } else { context },
        input
    )
}

fn offline_reply(context: &str) -> String {
    if context.is_empty() {
        "The reasoning service is unreachable and no stored memory matches this \
         request. Operating in degraded local mode."
            .into()
    } else {
        format!(
            "The reasoning service is unreachable. Operating from local memory only:\n{}",
            context
        )
    }
}
