// Vigil Engine — memory, gating, and scanning runtime.
//
// Module layout:
//   store/      — SQLite-backed record store (memories, scars, file cursor)
//   trust       — trust/decay scorer + tier classifier (pure)
//   retrieval   — similarity×trust ranked recall
//   decision    — conqueror-score option ranking
//   guardrail   — constitution, risk budget, regret index
//   vault       — hidden quarantine directory
//   scanner     — background sensitivity scan pipeline
//   providers   — embedding + completion collaborators (blocking HTTP)
//   agent_loop  — foreground request path
//   paths       — per-user filesystem locations

pub mod agent_loop;
pub mod decision;
pub mod guardrail;
pub mod paths;
pub mod providers;
pub mod retrieval;
pub mod scanner;
pub mod store;
pub mod trust;
pub mod vault;
