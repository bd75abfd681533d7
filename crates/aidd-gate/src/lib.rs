// crates/aidd-gate/src/lib.rs
// ============================================================================
// Module: AIDD Gate Engine
// Description: The gate trait, built-in preflight gates, and per-stage
//   short-circuit composition.
// Purpose: Decide whether a stage is ready to run before the dispatcher
//   launches its entrypoint.
// Dependencies: aidd-core, serde, serde_json, time
// ============================================================================

//! ## Overview
//! A gate is a pure function of a [`GateContext`] to a [`aidd_core::GateResult`].
//! [`preflight::run_stage_preflight`] walks the ordered gate list for a stage
//! and stops at the first blocking result, mirroring a short-circuited
//! boolean AND over the stage's readiness conditions.

pub mod branch_filter;
pub mod context;
pub mod gate;
pub mod gates;
pub mod markdown;
pub mod preflight;

pub use context::GateContext;
pub use gate::Gate;
pub use preflight::gates_for_stage;
pub use preflight::run_stage_preflight;
