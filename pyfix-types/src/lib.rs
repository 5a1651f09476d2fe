//! Shared DTOs (schemas-as-code) for the pyfix workspace.
//!
//! # Design constraints
//! - Plan types mirror the on-disk JSON document exactly and reject
//!   unknown fields (closed schema).
//! - Run types are ephemeral: one value per pipeline run, never persisted
//!   by the engine itself.
//! - Prefer adding optional fields over changing semantics.

pub mod plan;
pub mod run;
pub mod transformer;

/// Step params: an opaque JSON object forwarded verbatim to the resolved
/// transformer.
pub type StepParams = serde_json::Map<String, serde_json::Value>;

/// Minimum supported plan version.
pub const MIN_PLAN_VERSION: f64 = 0.1;
