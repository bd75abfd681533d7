// crates/aidd-dispatch/src/lib.rs
// ============================================================================
// Module: AIDD Stage Dispatcher
// Description: Resolves a command to a stage entrypoint, runs preflight,
//   updates active state, launches the entrypoint, and consumes its result.
// Purpose: Give the CLI and loop runner one call that performs a full stage
//   dispatch.
// Dependencies: aidd-core, aidd-config, aidd-gate, aidd-runner
// ============================================================================

//! ## Overview
//! [`dispatcher::dispatch_stage_command`] is the control-plane operation
//! this workspace exists to implement: normalize the command, resolve
//! roots/ticket, run preflight gates with short-circuit semantics, persist
//! the advanced active state, launch the entrypoint, and load its
//! machine-readable result.

pub mod dispatcher;
pub mod error;
pub mod stage_result_loader;
pub mod target;
pub mod ticket;

pub use dispatcher::DispatchOutcome;
pub use dispatcher::DispatchRequest;
pub use dispatcher::dispatch_stage_command;
pub use error::DispatchError;
pub use stage_result_loader::StageResultLoad;
pub use stage_result_loader::load_stage_result;
pub use target::resolve_target;
pub use ticket::resolve_effective_ticket;
