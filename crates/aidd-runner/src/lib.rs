// crates/aidd-runner/src/lib.rs
// ============================================================================
// Module: AIDD Command Runner
// Description: Subprocess execution with byte-capped output capture and
//   timeouts.
// Purpose: Give the dispatcher and loop runner one place to launch stage
//   entrypoints without each re-implementing truncation/timeout handling.
// Dependencies: aidd-core, tokio, thiserror
// ============================================================================

//! ## Overview
//! `aidd-runner` has no knowledge of stages, gates, or dispatch specs; it
//! only knows how to run a command with a bounded environment, a byte cap on
//! captured output, and a wall-clock timeout, and how to report what
//! happened. Everything stage-specific is layered on top by `aidd-dispatch`.

pub mod env;
pub mod runner;

pub use env::build_runtime_env;
pub use runner::CommandRunner;
pub use runner::RunOutcome;
pub use runner::RunRequest;
pub use runner::RunnerError;
