// crates/aidd-dispatch/src/dispatcher.rs
// ============================================================================
// Module: Stage Dispatcher
// Description: The control-plane operation: resolve a command, run
//   preflight, advance and persist active state, launch the entrypoint, and
//   load its result.
// Purpose: Give the CLI and loop runner one call that performs a full stage
//   dispatch.
// Dependencies: aidd-core, aidd-config, aidd-gate, aidd-runner
// ============================================================================

//! ## Overview
//! [`dispatch_stage_command`] runs the seven-step flow described in the
//! external interface contract: resolve target, resolve roots, resolve
//! ticket/scope, run preflight (skipped outright for commands that do not
//! require a workflow), advance and persist active state, launch the
//! entrypoint, and load its stage result. Every step that can fail reports
//! through [`DispatchError`] so the caller has one error type to render.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;

use aidd_config::GatesConfig;
use aidd_core::FileActiveStateStore;
use aidd_core::GateResult;
use aidd_core::ScopeKey;
use aidd_core::SlugHint;
use aidd_core::StageResult;
use aidd_core::Ticket;
use aidd_core::Timestamp;
use aidd_core::ActiveStateStore as _;
use aidd_core::resolve_roots;
use aidd_core::resolve_scope_key;
use aidd_core::write_active_state;
use aidd_gate::GateContext;
use aidd_gate::gates_for_stage;
use aidd_gate::run_stage_preflight;
use aidd_runner::CommandRunner;
use aidd_runner::RunRequest;
use aidd_runner::build_runtime_env;

use crate::error::DispatchError;
use crate::stage_result_loader::load_stage_result;
use crate::target::resolve_target;
use crate::ticket::resolve_effective_ticket;

/// Path globs every implement pass is allowed to touch, matching
/// [`aidd_gate::gates::DiffBoundaryCheck`]'s own default.
const DEFAULT_ALLOWED_DIFF_GLOBS: [&str; 2] = ["src/**", "tests/**"];

/// A fully-specified request to dispatch one stage command.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// The agent-host hint used to select a [`aidd_core::HostProfile`], e.g. `codex`.
    pub host_hint: String,
    /// The raw command name as invoked, before host-prefix stripping or
    /// legacy-alias normalization.
    pub raw_command: String,
    /// An explicitly supplied ticket, if any.
    pub ticket: Option<Ticket>,
    /// An explicitly supplied slug hint, if any.
    pub slug_hint: Option<SlugHint>,
    /// Directory root discovery starts its ancestor walk from.
    pub start_dir: PathBuf,
    /// The current branch name, when known, used for branch-exempt
    /// preflight skipping.
    pub branch: Option<String>,
    /// Paths changed since the workflow's base revision, used by
    /// `diff_boundary_check`.
    pub changed_files: Vec<PathBuf>,
    /// Extra arguments appended after the dispatch spec's own args.
    pub entrypoint_args: Vec<String>,
    /// Wall-clock timeout applied to the launched entrypoint.
    pub timeout: Duration,
    /// Maximum bytes of stdout/stderr captured from the entrypoint.
    pub max_output_bytes: usize,
    /// The current time, stamped onto any active-state write this dispatch
    /// performs.
    pub now: Timestamp,
}

/// What happened when a command was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A command with no associated stage (currently only
    /// `aidd-init-flow`) ran to completion; no preflight or active-state
    /// update applies.
    Ran {
        /// The entrypoint's exit code.
        exit_code: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
    /// Preflight blocked the stage; the entrypoint was never launched.
    Blocked {
        /// Every gate result evaluated before the short-circuit.
        gate_results: Vec<GateResult>,
    },
    /// The entrypoint was launched but exited non-zero or timed out.
    EntrypointFailed {
        /// The entrypoint's exit code.
        exit_code: i32,
        /// Captured standard error, for diagnostics.
        stderr: String,
        /// Whether the entrypoint was killed after exceeding its timeout.
        timed_out: bool,
    },
    /// The entrypoint exited zero and its stage result was loaded.
    Completed {
        /// The decoded stage result.
        stage_result: StageResult,
        /// Set when the result was recovered from a scope key other than
        /// the one the dispatcher expected.
        scope_mismatch: Option<ScopeKey>,
    },
}

/// Dispatches `request`, running the full stage-dispatch flow.
///
/// # Errors
///
/// Returns [`DispatchError`] when the command cannot be resolved, roots
/// cannot be found, no ticket is available, active state cannot be
/// read/written, the entrypoint cannot be launched, or its stage result
/// cannot be loaded.
pub async fn dispatch_stage_command(
    request: &DispatchRequest,
    gates_config: &GatesConfig,
) -> Result<DispatchOutcome, DispatchError> {
    let (_profile, target) = resolve_target(&request.host_hint, &request.raw_command)?;
    let spec = target.spec;
    let roots = resolve_roots(&request.start_dir)?;

    let Some(stage) = spec.stage else {
        let outcome = run_entrypoint(
            &spec.entrypoint,
            &join_args(&spec.args, &request.entrypoint_args),
            &roots.workspace_root,
            &BTreeMap::new(),
            request.timeout,
            request.max_output_bytes,
        )
        .await?;
        return Ok(DispatchOutcome::Ran {
            exit_code: outcome.exit_code,
            stdout: outcome.stdout,
            stderr: outcome.stderr,
        });
    };

    let store = FileActiveStateStore::new(roots.workflow_root.clone());
    let active_state = store.load()?;

    let effective_ticket = resolve_effective_ticket(request.ticket.clone(), active_state.as_ref(), &roots.workflow_root)?;
    let current_work_item = active_state.as_ref().and_then(|state| state.work_item.as_deref());
    let scope_key = resolve_scope_key(current_work_item, &effective_ticket);

    if spec.requires_workflow {
        let branch_exempt = aidd_gate::branch_filter::branch_is_exempt(
            request.branch.as_deref(),
            &gates_config.skip_branch_globs,
        );
        if !branch_exempt {
            let ctx = GateContext {
                workspace_root: roots.workspace_root.clone(),
                ticket: effective_ticket.clone(),
                scope_key: scope_key.clone(),
                stage,
                branch: request.branch.clone(),
                changed_files: request.changed_files.clone(),
            };
            let gates = gates_for_stage(
                stage,
                gates_config.min_question_count,
                gates_config.research_freshness_days,
                DEFAULT_ALLOWED_DIFF_GLOBS.iter().map(|glob| (*glob).to_string()).collect(),
            );
            let gate_results = run_stage_preflight(&ctx, &gates);
            if gate_results.last().is_some_and(GateResult::is_blocking) {
                return Ok(DispatchOutcome::Blocked { gate_results });
            }
        }
    }

    write_active_state(
        &store,
        Some(effective_ticket.as_str()),
        request.slug_hint.as_ref().map(SlugHint::as_str),
        Some(stage),
        None,
        request.now,
    )?;

    let mut overrides = BTreeMap::new();
    overrides.insert("AIDD_TICKET".to_string(), effective_ticket.as_str().to_string());
    overrides.insert("AIDD_SCOPE_KEY".to_string(), scope_key.as_str().to_string());
    overrides.insert("AIDD_STAGE".to_string(), stage.command_name().to_string());

    let dispatch_started_at = SystemTime::now();
    let outcome = run_entrypoint(
        &spec.entrypoint,
        &join_args(&spec.args, &request.entrypoint_args),
        &roots.workspace_root,
        &overrides,
        request.timeout,
        request.max_output_bytes,
    )
    .await?;

    if outcome.exit_code != 0 || outcome.timed_out {
        return Ok(DispatchOutcome::EntrypointFailed {
            exit_code: outcome.exit_code,
            stderr: outcome.stderr,
            timed_out: outcome.timed_out,
        });
    }

    let loaded = load_stage_result(&roots.workspace_root, stage, &scope_key, dispatch_started_at)?;
    Ok(DispatchOutcome::Completed {
        stage_result: loaded.result,
        scope_mismatch: loaded.scope_mismatch,
    })
}

/// Joins a dispatch spec's own arguments with caller-supplied extra
/// arguments.
fn join_args(spec_args: &[String], extra: &[String]) -> Vec<String> {
    spec_args.iter().cloned().chain(extra.iter().cloned()).collect()
}

/// Launches `entrypoint` with `args` under `cwd`, applying `overrides` on
/// top of the inherited runtime environment.
async fn run_entrypoint(
    entrypoint: &str,
    args: &[String],
    cwd: &Path,
    overrides: &BTreeMap<String, String>,
    timeout: Duration,
    max_output_bytes: usize,
) -> Result<aidd_runner::RunOutcome, DispatchError> {
    let request = RunRequest {
        program: entrypoint.to_string(),
        args: args.to_vec(),
        cwd: cwd.to_path_buf(),
        env: build_runtime_env(overrides),
        timeout,
        max_output_bytes,
    };
    CommandRunner::new().run(&request).await.map_err(DispatchError::from)
}

#[cfg(test)]
mod tests {
    use super::DispatchOutcome;
    use super::DispatchRequest;
    use super::dispatch_stage_command;
    use aidd_config::GatesConfig;
    use aidd_core::Timestamp;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn gates_config() -> GatesConfig {
        GatesConfig {
            min_question_count: 1,
            research_freshness_days: 14,
            max_diff_files: 40,
            skip_branch_globs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn unknown_command_is_reported_as_an_error() {
        let root = tempdir().expect("tempdir");
        fs::create_dir_all(root.path().join(".git")).expect("mkdir");
        let request = DispatchRequest {
            host_hint: "default".to_string(),
            raw_command: "bogus-command".to_string(),
            ticket: None,
            slug_hint: None,
            start_dir: root.path().to_path_buf(),
            branch: None,
            changed_files: Vec::new(),
            entrypoint_args: Vec::new(),
            timeout: Duration::from_secs(5),
            max_output_bytes: 4096,
            now: Timestamp::parse("2026-07-28T00:00:00Z").expect("valid"),
        };
        let result = dispatch_stage_command(&request, &gates_config()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_ticket_is_reported_for_a_stage_command() {
        let root = tempdir().expect("tempdir");
        fs::create_dir_all(root.path().join(".git")).expect("mkdir");
        let request = DispatchRequest {
            host_hint: "default".to_string(),
            raw_command: "idea-new".to_string(),
            ticket: None,
            slug_hint: None,
            start_dir: root.path().to_path_buf(),
            branch: None,
            changed_files: Vec::new(),
            entrypoint_args: Vec::new(),
            timeout: Duration::from_secs(5),
            max_output_bytes: 4096,
            now: Timestamp::parse("2026-07-28T00:00:00Z").expect("valid"),
        };
        let result = dispatch_stage_command(&request, &gates_config()).await;
        assert!(matches!(result, Err(super::DispatchError::MissingTicket(_))));
    }

    #[tokio::test]
    async fn research_stage_blocks_preflight_without_idea_md() {
        let root = tempdir().expect("tempdir");
        fs::create_dir_all(root.path().join(".git")).expect("mkdir");
        let request = DispatchRequest {
            host_hint: "default".to_string(),
            raw_command: "researcher".to_string(),
            ticket: Some(aidd_core::Ticket::from("AIDD-1")),
            slug_hint: None,
            start_dir: root.path().to_path_buf(),
            branch: None,
            changed_files: Vec::new(),
            entrypoint_args: Vec::new(),
            timeout: Duration::from_secs(5),
            max_output_bytes: 4096,
            now: Timestamp::parse("2026-07-28T00:00:00Z").expect("valid"),
        };
        let outcome = dispatch_stage_command(&request, &gates_config()).await.expect("dispatches");
        assert!(matches!(outcome, DispatchOutcome::Blocked { .. }));
    }

    #[tokio::test]
    async fn aidd_init_flow_skips_preflight_and_runs_directly() {
        let root = tempdir().expect("tempdir");
        fs::create_dir_all(root.path().join(".git")).expect("mkdir");
        let request = DispatchRequest {
            host_hint: "default".to_string(),
            raw_command: "aidd-init-flow".to_string(),
            ticket: None,
            slug_hint: None,
            start_dir: root.path().to_path_buf(),
            branch: None,
            changed_files: Vec::new(),
            entrypoint_args: Vec::new(),
            timeout: Duration::from_secs(5),
            max_output_bytes: 4096,
            now: Timestamp::parse("2026-07-28T00:00:00Z").expect("valid"),
        };
        let outcome = dispatch_stage_command(&request, &gates_config()).await.expect("dispatches");
        match outcome {
            DispatchOutcome::Ran { exit_code, .. } => assert_eq!(exit_code, 127),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
