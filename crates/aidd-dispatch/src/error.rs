// crates/aidd-dispatch/src/error.rs
// ============================================================================
// Module: Dispatch Errors
// Description: The failure modes of a full stage dispatch.
// Purpose: Give the CLI one error type to render regardless of which layer
//   failed.
// Dependencies: aidd-core, aidd-config, aidd-runner, thiserror
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

use aidd_config::DispatchTableError;
use aidd_core::ActiveStateError;
use aidd_core::RootsError;
use aidd_runner::RunnerError;

/// Failure dispatching a stage command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The command could not be resolved to a dispatch spec.
    #[error("command resolution failed: {0}")]
    UnknownCommand(#[from] DispatchTableError),
    /// Workspace/workflow roots could not be resolved from the starting
    /// directory.
    #[error("workspace roots could not be resolved: {0}")]
    Roots(#[from] RootsError),
    /// No ticket was supplied and none could be recovered from active
    /// state.
    #[error("no ticket was supplied and none is active at {0}")]
    MissingTicket(PathBuf),
    /// Active state could not be read or written.
    #[error("active state error: {0}")]
    ActiveState(#[from] ActiveStateError),
    /// The entrypoint subprocess could not be run.
    #[error("entrypoint could not be run: {0}")]
    Runner(#[from] RunnerError),
    /// No stage result was found at the expected path or via the fallback
    /// search.
    #[error("no stage result found at or near {0}")]
    MissingStageResult(PathBuf),
    /// A stage result was found but could not be decoded, or carried an
    /// unrecognized schema.
    #[error("stage result at {0} is malformed or carries an unrecognized schema")]
    MalformedStageResult(PathBuf),
}
