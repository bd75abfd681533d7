// crates/aidd-loop/src/loop_step.rs
// ============================================================================
// Module: Single Loop Iteration
// Description: Dispatches one implement or review stage and interprets its
//   stage result into an iteration outcome.
// Purpose: Give both the `loop run` CLI subcommand and `loop_runner` one
//   shared unit of work, so the decision of "what does done/continue/blocked
//   mean for this stage" lives in exactly one place.
// Dependencies: aidd-core, aidd-config, aidd-dispatch
// ============================================================================

//! ## Overview
//! A loop iteration dispatches exactly one of `implement` or `review` for
//! the work item currently active. [`run_loop_step`] interprets the
//! resulting [`aidd_core::StageResult`] into a [`LoopStepOutcome`] that
//! names the next stage to dispatch (if any), mirroring the
//! `implement → review → [revise|ship]` cycle described in the external
//! interface contract. [`loop_runner`](crate::loop_runner) owns the
//! iteration count and the decision of when to stop calling this function;
//! this module only ever looks at a single dispatch's result.

use std::path::PathBuf;
use std::time::Duration;

use aidd_config::GatesConfig;
use aidd_core::Stage;
use aidd_core::StageResultStatus;
use aidd_core::Ticket;
use aidd_core::Timestamp;
use aidd_core::Verdict;
use aidd_dispatch::DispatchOutcome;
use aidd_dispatch::DispatchRequest;
use aidd_dispatch::dispatch_stage_command;

/// Exit code the loop runner reports when a loop run ships.
pub const EXIT_CODE_DONE: i32 = 0;
/// Exit code the loop runner reports when another iteration is needed.
pub const EXIT_CODE_CONTINUE: i32 = 10;
/// Exit code the loop runner reports when the iteration cannot proceed.
pub const EXIT_CODE_BLOCKED: i32 = 20;
/// Exit code the loop runner reports when a dispatch itself fails.
pub const EXIT_CODE_ERROR: i32 = 30;

/// What a single loop iteration decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStepOutcome {
    /// `review` shipped; the loop's current work item is finished.
    Ship,
    /// `review` asked for another implement pass.
    Revise,
    /// A stage produced a `continue` result; the same stage should be
    /// dispatched again next iteration.
    Continue {
        /// The stage to dispatch again.
        stage: Stage,
    },
    /// Preflight or a stage result reported `blocked`.
    Blocked {
        /// A machine-readable reason code, when one was reported.
        reason_code: Option<String>,
        /// A human-readable message, when one was available.
        message: Option<String>,
    },
    /// The entrypoint could not be run or its result could not be loaded.
    Error {
        /// A human-readable description of the failure.
        message: String,
    },
}

impl LoopStepOutcome {
    /// Returns the exit code this outcome maps to, per the external
    /// interface contract's loop-step exit codes (§6.1).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Ship => EXIT_CODE_DONE,
            Self::Revise | Self::Continue { .. } => EXIT_CODE_CONTINUE,
            Self::Blocked { .. } => EXIT_CODE_BLOCKED,
            Self::Error { .. } => EXIT_CODE_ERROR,
        }
    }
}

/// A fully-specified request to dispatch one loop iteration.
#[derive(Debug, Clone)]
pub struct LoopStepRequest {
    /// The agent-host hint used to select a [`aidd_core::HostProfile`].
    pub host_hint: String,
    /// The stage to dispatch this iteration: always `implement` or
    /// `review`.
    pub stage: Stage,
    /// The ticket the active workflow is operating on.
    pub ticket: Ticket,
    /// Directory root discovery starts its ancestor walk from.
    pub start_dir: PathBuf,
    /// The current branch name, when known.
    pub branch: Option<String>,
    /// Paths changed since the workflow's base revision.
    pub changed_files: Vec<PathBuf>,
    /// Wall-clock timeout applied to the launched entrypoint.
    pub timeout: Duration,
    /// Maximum bytes of stdout/stderr captured from the entrypoint.
    pub max_output_bytes: usize,
    /// The current time, stamped onto any active-state write this
    /// dispatch performs.
    pub now: Timestamp,
}

/// Dispatches one `implement`/`review` iteration and interprets its
/// result.
///
/// `stage` must be [`Stage::Implement`] or [`Stage::Review`]; any other
/// value is accepted but produces a `Continue { stage }` outcome for that
/// same stage on a `done` result, since only `review` carries a verdict.
pub async fn run_loop_step(request: &LoopStepRequest, gates_config: &GatesConfig) -> LoopStepOutcome {
    let command_name = request.stage.command_name().to_string();
    let dispatch_request = DispatchRequest {
        host_hint: request.host_hint.clone(),
        raw_command: command_name,
        ticket: Some(request.ticket.clone()),
        slug_hint: None,
        start_dir: request.start_dir.clone(),
        branch: request.branch.clone(),
        changed_files: request.changed_files.clone(),
        entrypoint_args: Vec::new(),
        timeout: request.timeout,
        max_output_bytes: request.max_output_bytes,
        now: request.now,
    };

    match dispatch_stage_command(&dispatch_request, gates_config).await {
        Ok(DispatchOutcome::Blocked { gate_results }) => LoopStepOutcome::Blocked {
            reason_code: Some("preflight_blocked".to_string()),
            message: gate_results.last().and_then(|result| result.message.clone()),
        },
        Ok(DispatchOutcome::EntrypointFailed { exit_code, stderr, timed_out }) => LoopStepOutcome::Error {
            message: if timed_out {
                format!("{} timed out (exit {exit_code}): {stderr}", request.stage)
            } else {
                format!("{} exited {exit_code}: {stderr}", request.stage)
            },
        },
        Ok(DispatchOutcome::Ran { exit_code, stderr, .. }) => LoopStepOutcome::Error {
            message: format!("unexpected non-stage dispatch during loop step (exit {exit_code}): {stderr}"),
        },
        Ok(DispatchOutcome::Completed { stage_result, .. }) => match stage_result.status {
            StageResultStatus::Blocked => LoopStepOutcome::Blocked {
                reason_code: stage_result.reason_code,
                message: stage_result.summary,
            },
            StageResultStatus::Continue => LoopStepOutcome::Continue { stage: request.stage },
            StageResultStatus::Done => interpret_done(request.stage, stage_result.verdict),
        },
        Err(err) => LoopStepOutcome::Error { message: err.to_string() },
    }
}

/// Interprets a `done` stage result for `stage`.
fn interpret_done(stage: Stage, verdict: Option<Verdict>) -> LoopStepOutcome {
    match stage {
        Stage::Implement => LoopStepOutcome::Continue { stage: Stage::Review },
        Stage::Review => match verdict {
            Some(Verdict::Ship) => LoopStepOutcome::Ship,
            Some(Verdict::Revise) => LoopStepOutcome::Revise,
            Some(Verdict::Blocked) => LoopStepOutcome::Blocked {
                reason_code: Some("review_verdict_blocked".to_string()),
                message: None,
            },
            None => LoopStepOutcome::Error {
                message: "review stage result was done but carried no verdict".to_string(),
            },
        },
        other => LoopStepOutcome::Continue { stage: other },
    }
}

#[cfg(test)]
mod tests {
    use super::LoopStepOutcome;
    use super::interpret_done;
    use aidd_core::Stage;
    use aidd_core::Verdict;

    #[test]
    fn implement_done_continues_into_review() {
        let outcome = interpret_done(Stage::Implement, None);
        assert_eq!(outcome, LoopStepOutcome::Continue { stage: Stage::Review });
    }

    #[test]
    fn review_ship_verdict_ships() {
        assert_eq!(interpret_done(Stage::Review, Some(Verdict::Ship)), LoopStepOutcome::Ship);
    }

    #[test]
    fn review_revise_verdict_asks_for_another_implement_pass() {
        assert_eq!(interpret_done(Stage::Review, Some(Verdict::Revise)), LoopStepOutcome::Revise);
    }

    #[test]
    fn review_without_a_verdict_is_an_error() {
        assert!(matches!(interpret_done(Stage::Review, None), LoopStepOutcome::Error { .. }));
    }

    #[test]
    fn exit_codes_match_the_external_interface_contract() {
        assert_eq!(LoopStepOutcome::Ship.exit_code(), 0);
        assert_eq!(LoopStepOutcome::Revise.exit_code(), 10);
        assert_eq!(LoopStepOutcome::Blocked { reason_code: None, message: None }.exit_code(), 20);
        assert_eq!(LoopStepOutcome::Error { message: String::new() }.exit_code(), 30);
    }
}
