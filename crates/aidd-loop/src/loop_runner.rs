// crates/aidd-loop/src/loop_runner.rs
// ============================================================================
// Module: Loop Runner
// Description: Iterates loop_step across implement/review until ship,
//   blocked, max-iterations, or error; appends a canonical run log.
// Purpose: Turn a single `implement → review → [revise|ship]` iteration
//   into the repeatable loop the external interface exposes as `loop run`,
//   including QA-repair re-entry and next-work-item advancement.
// Dependencies: aidd-core, aidd-config, aidd-dispatch
// ============================================================================

//! ## Overview
//! [`run_loop`] drives [`run_loop_step`](crate::loop_step::run_loop_step)
//! repeatedly against one ticket's active state. Each call:
//!
//! 1. Loads [`ActiveState`] for the ticket's scope key and normalizes the
//!    work item for the stage about to run.
//! 2. Dispatches one loop step.
//! 3. On `ship`, asks [`select_next_work_item`] whether another tasklist
//!    iteration is open; if so, writes it as the new active work item and
//!    stages `implement` for the next iteration instead of stopping.
//! 4. On `revise`, keeps the same work item and stages `implement` again.
//! 5. Appends one canonical line to the ticket's `loop.run.log`.
//!
//! The loop stops after `max_iterations` with exit code 11, or the first
//! time a step ships with no further work, blocks, or errors.

use std::fmt::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use aidd_config::GatesConfig;
use aidd_core::ActiveState;
use aidd_core::ActiveStateStore;
use aidd_core::FileActiveStateStore;
use aidd_core::ScopeKey;
use aidd_core::Stage;
use aidd_core::Ticket;
use aidd_core::Timestamp;
use aidd_core::resolve_scope_key;
use aidd_core::write_active_state;
use thiserror::Error;
use tokio::fs;

use crate::loop_step::EXIT_CODE_BLOCKED;
use crate::loop_step::EXIT_CODE_DONE;
use crate::loop_step::EXIT_CODE_ERROR;
use crate::loop_step::LoopStepOutcome;
use crate::loop_step::LoopStepRequest;
use crate::loop_step::run_loop_step;
use crate::qa_repair::QaRepairError;
use crate::qa_repair::scan_qa_handoffs;
use crate::qa_repair::select_qa_repair_work_item;
use crate::select_next::select_next_work_item;

/// Exit code reported when a loop run exhausts its iteration budget
/// without reaching a terminal outcome.
pub const EXIT_CODE_MAX_ITERATIONS: i32 = 11;

/// How a QA-repair re-entry should pick its work item, mirroring the
/// external `--from-qa` knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaRepairMode {
    /// No QA repair requested; run the loop against the active work item.
    None,
    /// Repair was requested explicitly by the caller.
    Manual,
    /// Repair was triggered automatically after a blocked QA result.
    Auto,
}

/// Parameters for one `loop run` invocation.
#[derive(Debug, Clone)]
pub struct LoopRunRequest {
    /// The agent-host hint forwarded to every dispatched stage.
    pub host_hint: String,
    /// The ticket whose active workflow this loop run drives.
    pub ticket: Ticket,
    /// Directory root discovery starts its ancestor walk from.
    pub start_dir: PathBuf,
    /// The current branch name, when known.
    pub branch: Option<String>,
    /// Paths changed since the workflow's base revision.
    pub changed_files: Vec<PathBuf>,
    /// Wall-clock timeout applied to each dispatched entrypoint.
    pub timeout: Duration,
    /// Maximum bytes of stdout/stderr captured per dispatched entrypoint.
    pub max_output_bytes: usize,
    /// Hard cap on the number of iterations this run performs.
    pub max_iterations: u32,
    /// QA-repair re-entry mode.
    pub from_qa: QaRepairMode,
    /// Explicit `--work-item-key`, when the caller named one directly.
    pub work_item_key: Option<String>,
    /// Explicit `--select-qa-handoff`, when the caller named one
    /// directly.
    pub select_qa_handoff: Option<String>,
}

/// Final outcome of a `loop run` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopRunOutcome {
    /// The loop shipped with no further open work items.
    Shipped,
    /// A step reported `blocked`.
    Blocked {
        /// A machine-readable reason code, when one was reported.
        reason_code: Option<String>,
    },
    /// The iteration budget was exhausted before a terminal outcome.
    MaxIterations,
    /// A step failed to dispatch or its result could not be interpreted.
    Error {
        /// A human-readable description of the failure.
        message: String,
    },
}

impl LoopRunOutcome {
    /// Returns the exit code this outcome maps to, per the external
    /// interface contract's `loop_run` exit codes (§6.1).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Shipped => EXIT_CODE_DONE,
            Self::Blocked { .. } => EXIT_CODE_BLOCKED,
            Self::MaxIterations => EXIT_CODE_MAX_ITERATIONS,
            Self::Error { .. } => EXIT_CODE_ERROR,
        }
    }
}

/// Failure starting or persisting a loop run.
#[derive(Debug, Error)]
pub enum LoopRunError {
    /// The ticket had no active state and no work item was given to seed
    /// one.
    #[error("no active state and no work item given for ticket {0}")]
    NoActiveWorkItem(String),
    /// QA-repair work-item selection failed.
    #[error(transparent)]
    QaRepair(#[from] QaRepairError),
    /// The active state store could not be read or written.
    #[error(transparent)]
    ActiveState(#[from] aidd_core::ActiveStateError),
    /// The tasklist or QA handoff document could not be read.
    #[error("failed to read {path}: {source}")]
    ReadDoc {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The run log could not be appended to.
    #[error("failed to append to {path}: {source}")]
    WriteLog {
        /// The path that failed to write.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Runs a loop to a terminal outcome, dispatching up to
/// `request.max_iterations` stage steps.
///
/// # Errors
///
/// Returns [`LoopRunError`] when the run cannot even start (no active
/// work item to seed, a QA-repair selection is ambiguous, or the active
/// state store / tasklist / run log cannot be read or written). Failures
/// of an individual dispatched stage surface as
/// [`LoopRunOutcome::Error`] instead, since the loop should still emit a
/// structured final record for those.
pub async fn run_loop(request: &LoopRunRequest, workflow_root: &Path, workspace_root: &Path, gates_config: &GatesConfig, now: impl Fn() -> Timestamp) -> Result<LoopRunOutcome, LoopRunError> {
    let store = FileActiveStateStore::new(workflow_root.to_path_buf());
    let mut work_item = seed_work_item(request, workspace_root, &store).await?;
    let mut stage = Stage::Implement;

    for iteration in 1..=request.max_iterations {
        let state = persist_active_state(&store, &request.ticket, stage, &work_item, now())?;
        let scope_key = resolve_scope_key(state.work_item.as_deref(), &request.ticket);

        let step_request = LoopStepRequest {
            host_hint: request.host_hint.clone(),
            stage,
            ticket: request.ticket.clone(),
            start_dir: request.start_dir.clone(),
            branch: request.branch.clone(),
            changed_files: request.changed_files.clone(),
            timeout: request.timeout,
            max_output_bytes: request.max_output_bytes,
            now: now(),
        };
        let outcome = run_loop_step(&step_request, gates_config).await;
        append_run_log(
            workspace_root,
            &request.ticket,
            iteration,
            stage,
            &scope_key,
            &outcome,
        )
        .await?;

        match outcome {
            LoopStepOutcome::Continue { stage: next_stage } => {
                stage = next_stage;
                continue;
            }
            LoopStepOutcome::Revise => {
                stage = Stage::Implement;
                continue;
            }
            LoopStepOutcome::Ship => {
                let tasklist_path = tasklist_path(workspace_root, &request.ticket);
                let tasklist_text = read_optional(&tasklist_path).await?;
                match select_next_work_item(&tasklist_text, &work_item) {
                    Some(next_key) => {
                        work_item = next_key;
                        stage = Stage::Implement;
                        continue;
                    }
                    None => return Ok(LoopRunOutcome::Shipped),
                }
            }
            LoopStepOutcome::Blocked { reason_code, .. } => return Ok(LoopRunOutcome::Blocked { reason_code }),
            LoopStepOutcome::Error { message } => return Ok(LoopRunOutcome::Error { message }),
        }
    }

    Ok(LoopRunOutcome::MaxIterations)
}

/// Resolves the work item a loop run starts with, honoring QA-repair
/// re-entry when requested.
async fn seed_work_item(request: &LoopRunRequest, workspace_root: &Path, store: &FileActiveStateStore) -> Result<String, LoopRunError> {
    if !matches!(request.from_qa, QaRepairMode::None) {
        let qa_log_path = qa_handoff_log_path(workspace_root, &request.ticket);
        let qa_text = read_optional(&qa_log_path).await?;
        let blocking_handoffs = scan_qa_handoffs(&qa_text);
        let key = select_qa_repair_work_item(
            request.work_item_key.as_deref(),
            request.select_qa_handoff.as_deref(),
            &blocking_handoffs,
        )?;
        return Ok(key);
    }

    if let Some(key) = &request.work_item_key {
        return Ok(key.clone());
    }

    if let Some(active) = store.load()?
        && let Some(existing) = active.work_item
    {
        return Ok(existing);
    }

    Err(LoopRunError::NoActiveWorkItem(request.ticket.as_str().to_string()))
}

/// Writes the active state for the upcoming iteration, normalizing the
/// work item for the stage about to run (§4.3).
fn persist_active_state(
    store: &FileActiveStateStore,
    ticket: &Ticket,
    stage: Stage,
    work_item: &str,
    now: Timestamp,
) -> Result<ActiveState, LoopRunError> {
    Ok(write_active_state(store, Some(ticket.as_str()), None, Some(stage), Some(work_item), now)?)
}

/// The path a ticket's tasklist document lives at.
fn tasklist_path(workspace_root: &Path, ticket: &Ticket) -> PathBuf {
    workspace_root.join("docs").join("tasklist").join(format!("{}.md", ticket.as_str()))
}

/// The path a ticket's QA handoff log lives at, scanned for blocking
/// `<!-- handoff:qa key=... -->` markers.
fn qa_handoff_log_path(workspace_root: &Path, ticket: &Ticket) -> PathBuf {
    workspace_root.join("reports").join("loops").join(ticket.as_str()).join("qa.handoffs.md")
}

/// Reads `path`, returning an empty string when it does not exist.
async fn read_optional(path: &Path) -> Result<String, LoopRunError> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(LoopRunError::ReadDoc { path: path.to_path_buf(), source }),
    }
}

/// Appends one canonical line to `reports/loops/<ticket>/loop.run.log`.
async fn append_run_log(workspace_root: &Path, ticket: &Ticket, iteration: u32, stage: Stage, scope_key: &ScopeKey, outcome: &LoopStepOutcome) -> Result<(), LoopRunError> {
    let (status, reason_code) = match outcome {
        LoopStepOutcome::Ship => ("ship", None),
        LoopStepOutcome::Revise => ("revise", None),
        LoopStepOutcome::Continue { .. } => ("continue", None),
        LoopStepOutcome::Blocked { reason_code, .. } => ("blocked", reason_code.clone()),
        LoopStepOutcome::Error { message } => ("error", Some(message.clone())),
    };

    let mut line = String::new();
    let _ = write!(
        line,
        "ticket={} iteration={iteration} stage={stage} scope_key={scope_key} exit_code={} status={status}",
        ticket.as_str(),
        outcome.exit_code(),
    );
    if let Some(code) = reason_code {
        let _ = write!(line, " reason_code={code}");
    }
    line.push('\n');

    let log_dir = workspace_root.join("reports").join("loops").join(ticket.as_str());
    let log_path = log_dir.join("loop.run.log");
    fs::create_dir_all(&log_dir).await.map_err(|source| LoopRunError::WriteLog { path: log_path.clone(), source })?;

    use tokio::io::AsyncWriteExt;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .await
        .map_err(|source| LoopRunError::WriteLog { path: log_path.clone(), source })?;
    file.write_all(line.as_bytes()).await.map_err(|source| LoopRunError::WriteLog { path: log_path.clone(), source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::LoopRunOutcome;

    #[test]
    fn exit_codes_match_the_external_interface_contract() {
        assert_eq!(LoopRunOutcome::Shipped.exit_code(), 0);
        assert_eq!(LoopRunOutcome::Blocked { reason_code: None }.exit_code(), 20);
        assert_eq!(LoopRunOutcome::MaxIterations.exit_code(), 11);
        assert_eq!(LoopRunOutcome::Error { message: String::new() }.exit_code(), 30);
    }
}
