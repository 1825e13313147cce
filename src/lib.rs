// Vigil Engine — institutional memory and decision gating for a local
// autonomous agent.
//
// Layering:
//   atoms/  — constants, error types, plain data types (no I/O)
//   engine/ — store, scoring, retrieval, guardrails, scanner, providers

pub mod atoms;
pub mod engine;
