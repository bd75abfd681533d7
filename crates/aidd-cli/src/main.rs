// crates/aidd-cli/src/main.rs
// ============================================================================
// Module: AIDD CLI
// Description: The `aidd` binary: wires clap subcommands to
//   aidd-dispatch/aidd-loop/aidd-hooks, renders structured output, and maps
//   every outcome to the external interface contract's exit codes.
// Purpose: Give every agent host (hooks, loop runners, IDE integrations) one
//   compiled entrypoint instead of re-implementing dispatch/gate/hook logic
//   per host.
// Dependencies: aidd-core, aidd-config, aidd-dispatch, aidd-gate, aidd-hooks,
//   aidd-loop, aidd-runner, clap, serde, serde_json, serde_yaml, thiserror,
//   time, tokio
// ============================================================================

//! ## Overview
//! `aidd` has five command groups: a bare stage command (`aidd <command>`,
//! the entrypoint-equivalent surface described in the external interface
//! contract's §6.1), `loop run`/`loop step` (the bounded
//! `implement → review → [revise|ship]` cycle), `hook pre-tool-use`/`hook
//! user-prompt-submit` (the PreToolUse/UserPromptSubmit mediation an agent
//! host shells out to on every tool call and turn), `status`, and `config
//! show`. Every subcommand renders its result through [`output::render`] and
//! every uncaught error is reduced to one stderr line unless `AIDD_DEBUG` is
//! set, per §7 of the external interface contract.

mod boundaries;
mod output;
mod runtime_context;

use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use aidd_core::ActiveStateStore as _;
use aidd_core::FileActiveStateStore;
use aidd_core::GateResult;
use aidd_core::HookContext;
use aidd_core::ScopeKey;
use aidd_core::SlugHint;
use aidd_core::Stage;
use aidd_core::StageResult;
use aidd_core::StageResultStatus;
use aidd_core::Ticket;
use aidd_core::Timestamp;
use aidd_core::resolve_roots;
use aidd_core::resolve_scope_key;
use aidd_dispatch::DispatchOutcome;
use aidd_dispatch::DispatchRequest;
use aidd_dispatch::dispatch_stage_command;
use aidd_hooks::ContextBudgetUsage;
use aidd_hooks::Decision;
use aidd_hooks::PolicyConfig;
use aidd_hooks::PolicyDecision;
use aidd_hooks::PreToolUseRequest;
use aidd_hooks::decide_pre_tool_use;
use aidd_hooks::decide_user_prompt_submit;
use aidd_hooks::should_emit;
use aidd_hooks::stamp_path;
use aidd_hooks::write_stamp;
use aidd_loop::LoopRunOutcome;
use aidd_loop::LoopRunRequest;
use aidd_loop::LoopStepOutcome;
use aidd_loop::LoopStepRequest;
use aidd_loop::QaRepairMode;
use aidd_loop::run_loop;
use aidd_loop::run_loop_step;

use crate::output::OutputFormat;
use crate::output::render;
use crate::runtime_context::RuntimeContext;

/// Path globs every hook policy evaluation treats as carrying an extra
/// untrusted-data warning, matching the default configured in this
/// workspace's own `.aidd-plugin/config` conventions.
const DEFAULT_DEPENDENCY_SEGMENTS: [&str; 5] = ["node_modules", "vendor", "third_party", "site-packages", ".venv"];

/// Fallback warn-budget used when `config/context_gc.json` is absent, e.g.
/// before a workflow root has ever been initialized.
const DEFAULT_WARN_TOKEN_BUDGET: u32 = 60_000;
/// Fallback hard-budget paired with [`DEFAULT_WARN_TOKEN_BUDGET`].
const DEFAULT_HARD_TOKEN_BUDGET: u32 = 90_000;

/// Fallback gate thresholds used when `config/gates.json` is absent, e.g.
/// before `aidd-init-flow` has run.
fn default_gates_config() -> aidd_config::GatesConfig {
    aidd_config::GatesConfig {
        min_question_count: 1,
        research_freshness_days: 14,
        max_diff_files: 40,
        skip_branch_globs: Vec::new(),
    }
}

/// Entrypoint. Parses arguments, runs the resolved command, and maps the
/// outcome to a process exit code.
///
/// `AIDD_DEBUG` switches [`emit_error`] from a single-line message to the
/// error's full `Debug` rendering; the flag is read directly here rather
/// than through [`RuntimeContext`] so a parse failure that happens before
/// the runtime context is built can still honor it.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let debug = std::env::var("AIDD_DEBUG").is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
    match run().await {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err, debug);
            exit_code_from(err.exit_code())
        }
    }
}

/// Parses the command line and dispatches to the matching command handler.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let ctx = RuntimeContext::from_env();
    match cli.command {
        Commands::Dispatch(args) => command_dispatch(&args, &ctx).await,
        Commands::Loop { command } => match command {
            LoopCommand::Run(args) => command_loop_run(&args, &ctx).await,
            LoopCommand::Step(args) => command_loop_step(&args, &ctx).await,
        },
        Commands::Hook { command } => match command {
            HookCommand::PreToolUse(args) => command_hook_pre_tool_use(&args, &ctx),
            HookCommand::UserPromptSubmit(args) => command_hook_user_prompt_submit(&args, &ctx),
        },
        Commands::Status(args) => command_status(&args, &ctx),
        Commands::Config { command } => match command {
            ConfigCommand::Show(args) => command_config_show(&args),
        },
    }
}

/// The `aidd` command-line interface.
#[derive(Debug, Parser)]
#[command(name = "aidd", about = "Stage dispatch and gate engine for AI-assisted development workflows")]
struct Cli {
    /// The command group to run.
    #[command(subcommand)]
    command: Commands,
}

/// The top-level command groups `aidd` exposes.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Dispatches one canonical, legacy-aliased, or host-prefixed stage
    /// command (the external interface contract's entrypoint-equivalent
    /// surface).
    Dispatch(DispatchArgs),
    /// Runs or steps the bounded implement/review loop.
    Loop {
        /// The loop operation to perform.
        #[command(subcommand)]
        command: LoopCommand,
    },
    /// Mediates an agent host's file/tool access.
    Hook {
        /// The hook event being decided.
        #[command(subcommand)]
        command: HookCommand,
    },
    /// Shows the active workflow state for a ticket.
    Status(StatusArgs),
    /// Shows persisted workflow configuration.
    Config {
        /// The config operation to perform.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Loop subcommands.
#[derive(Debug, Subcommand)]
enum LoopCommand {
    /// Drives a ticket to ship/blocked/max-iterations/error.
    Run(LoopRunArgs),
    /// Dispatches exactly one implement or review iteration.
    Step(LoopStepArgs),
}

/// Hook subcommands.
#[derive(Debug, Subcommand)]
enum HookCommand {
    /// Decides a `PreToolUse` event.
    PreToolUse(PreToolUseArgs),
    /// Decides a `UserPromptSubmit` event.
    UserPromptSubmit(UserPromptSubmitArgs),
}

/// Config subcommands.
#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Prints the loaded gate, context-GC, and convention thresholds.
    Show(ConfigShowArgs),
}

/// Arguments common to every flag listed as "propagated through" in the
/// external interface contract's §6.1.
#[derive(Debug, Clone, clap::Args)]
struct CommonDispatchFlags {
    /// An explicit ticket identifier; falls back to the workflow's active
    /// ticket when omitted.
    #[arg(long)]
    ticket: Option<String>,
    /// A free-text hint appended when establishing a new ticket's scope
    /// key.
    #[arg(long = "slug-hint")]
    slug_hint: Option<String>,
    /// An agent-host hint used to select a host profile, e.g. `codex`.
    #[arg(long)]
    host: Option<String>,
    /// The current branch name, used to exempt configured branch globs
    /// from preflight gates.
    #[arg(long)]
    branch: Option<String>,
    /// Output encoding for the structured result.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Accepted for parity with the external interface contract; this
    /// binary always renders one structured result rather than a token
    /// stream, so `text`/`tools`/`raw` are equivalent here.
    #[arg(long)]
    stream: Option<String>,
}

/// Arguments to `aidd dispatch`.
#[derive(Debug, clap::Args)]
struct DispatchArgs {
    /// The command to dispatch, e.g. `plan-new`, `codex:research`, or a
    /// legacy alias like `aidd-plan-flow`.
    command: String,
    /// Flags shared with the loop subcommands.
    #[command(flatten)]
    common: CommonDispatchFlags,
    /// Paths changed since the workflow's base revision, consulted by
    /// `diff_boundary_check`.
    #[arg(long = "changed-file")]
    changed_files: Vec<PathBuf>,
    /// Wall-clock timeout, in seconds, applied to the launched entrypoint.
    #[arg(long = "timeout-secs", default_value_t = 600)]
    timeout_secs: u64,
    /// Maximum bytes of stdout/stderr captured from the entrypoint.
    #[arg(long = "max-output-bytes", default_value_t = 1_048_576)]
    max_output_bytes: usize,
    /// Stage-specific arguments forwarded verbatim to the entrypoint.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Arguments to `aidd loop run`.
#[derive(Debug, clap::Args)]
struct LoopRunArgs {
    /// The ticket whose active workflow this loop run drives.
    #[arg(long)]
    ticket: String,
    /// An agent-host hint used to select a host profile for every
    /// dispatched stage.
    #[arg(long)]
    host: Option<String>,
    /// The current branch name, when known.
    #[arg(long)]
    branch: Option<String>,
    /// Paths changed since the workflow's base revision.
    #[arg(long = "changed-file")]
    changed_files: Vec<PathBuf>,
    /// Output encoding for the structured result.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Wall-clock timeout, in seconds, applied to each dispatched
    /// entrypoint.
    #[arg(long = "timeout-secs", default_value_t = 600)]
    timeout_secs: u64,
    /// Maximum bytes of stdout/stderr captured per dispatched entrypoint.
    #[arg(long = "max-output-bytes", default_value_t = 1_048_576)]
    max_output_bytes: usize,
    /// Hard cap on the number of iterations this run performs.
    #[arg(long = "max-iterations", default_value_t = 20)]
    max_iterations: u32,
    /// Requests QA-repair re-entry instead of continuing the active work
    /// item.
    #[arg(long = "from-qa", value_enum)]
    from_qa: Option<FromQaArg>,
    /// Names the work item to repair or continue directly.
    #[arg(long = "work-item-key")]
    work_item_key: Option<String>,
    /// Names a specific blocking QA handoff to repair, when more than one
    /// is open.
    #[arg(long = "select-qa-handoff")]
    select_qa_handoff: Option<String>,
}

/// `--from-qa` values accepted by [`LoopRunArgs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FromQaArg {
    /// Repair was requested explicitly by the caller.
    Manual,
    /// Repair was triggered automatically after a blocked QA result.
    Auto,
}

impl From<FromQaArg> for QaRepairMode {
    fn from(value: FromQaArg) -> Self {
        match value {
            FromQaArg::Manual => Self::Manual,
            FromQaArg::Auto => Self::Auto,
        }
    }
}

/// Arguments to `aidd loop step`.
#[derive(Debug, clap::Args)]
struct LoopStepArgs {
    /// The ticket the active workflow is operating on.
    #[arg(long)]
    ticket: String,
    /// The stage to dispatch this iteration.
    #[arg(long, value_enum)]
    stage: LoopStageArg,
    /// An agent-host hint used to select a host profile.
    #[arg(long)]
    host: Option<String>,
    /// The current branch name, when known.
    #[arg(long)]
    branch: Option<String>,
    /// Paths changed since the workflow's base revision.
    #[arg(long = "changed-file")]
    changed_files: Vec<PathBuf>,
    /// Output encoding for the structured result.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Wall-clock timeout, in seconds, applied to the launched entrypoint.
    #[arg(long = "timeout-secs", default_value_t = 600)]
    timeout_secs: u64,
    /// Maximum bytes of stdout/stderr captured from the entrypoint.
    #[arg(long = "max-output-bytes", default_value_t = 1_048_576)]
    max_output_bytes: usize,
}

/// Stages a single loop step may dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LoopStageArg {
    /// Dispatches `implement`.
    Implement,
    /// Dispatches `review`.
    Review,
}

impl From<LoopStageArg> for Stage {
    fn from(value: LoopStageArg) -> Self {
        match value {
            LoopStageArg::Implement => Self::Implement,
            LoopStageArg::Review => Self::Review,
        }
    }
}

/// Arguments to `aidd hook pre-tool-use`.
#[derive(Debug, clap::Args)]
struct PreToolUseArgs {
    /// Inline JSON payload; falls back to `HOOK_PAYLOAD`/`AIDD_HOOK_PAYLOAD`,
    /// then stdin, when omitted.
    #[arg(long)]
    payload: Option<String>,
    /// Overrides the stage looked up from active state.
    #[arg(long)]
    stage: Option<String>,
    /// The size, in bytes, of the file the tool call targets, when known.
    #[arg(long = "file-size")]
    file_size: Option<u64>,
    /// Directory name segments whose contents carry an extra
    /// untrusted-data warning.
    #[arg(long = "dependency-segment")]
    dependency_segments: Vec<String>,
    /// Byte threshold above which a `Read` is treated as large.
    #[arg(long = "max-read-bytes", default_value_t = 1_000_000)]
    max_read_bytes: u64,
    /// Disables the large-output bash command rewrite.
    #[arg(long = "no-bash-output-guard")]
    no_bash_output_guard: bool,
    /// Number of trailing lines printed inline after a bash output
    /// rewrite.
    #[arg(long = "tail-lines", default_value_t = 200)]
    tail_lines: u32,
    /// Directory, relative to the workspace root, large command output is
    /// teed to.
    #[arg(long = "log-dir", default_value = "reports/logs")]
    log_dir: String,
    /// Minimum interval, in seconds, between repeated warning messages for
    /// the same guard.
    #[arg(long = "min-warn-interval-secs", default_value_t = 300)]
    min_warn_interval_secs: u64,
    /// Output encoding for the decision.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

/// Arguments to `aidd hook user-prompt-submit`.
#[derive(Debug, clap::Args)]
struct UserPromptSubmitArgs {
    /// Inline JSON payload; falls back to `HOOK_PAYLOAD`/`AIDD_HOOK_PAYLOAD`,
    /// then stdin, when omitted.
    #[arg(long)]
    payload: Option<String>,
    /// Approximate tokens consumed by the transcript so far; overrides any
    /// value carried in the payload.
    #[arg(long = "used-tokens")]
    used_tokens: Option<u64>,
    /// Overrides the warn-budget loaded from `config/context_gc.json`.
    #[arg(long = "warn-token-budget")]
    warn_token_budget: Option<u64>,
    /// Overrides the hard-budget loaded from `config/context_gc.json`.
    #[arg(long = "hard-token-budget")]
    hard_token_budget: Option<u64>,
    /// Directory the rate-limiting stamp file is written under, relative
    /// to the workspace root.
    #[arg(long = "log-dir", default_value = "reports/logs")]
    log_dir: String,
    /// Minimum interval, in seconds, between repeated context-budget
    /// warnings.
    #[arg(long = "min-warn-interval-secs", default_value_t = 300)]
    min_warn_interval_secs: u64,
    /// Output encoding for the decision.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

/// Arguments to `aidd status`.
#[derive(Debug, clap::Args)]
struct StatusArgs {
    /// The ticket to show status for; falls back to the workflow root's
    /// active state when omitted.
    #[arg(long)]
    ticket: Option<String>,
    /// Overrides the slug hint shown in the rendered status, without
    /// persisting it.
    #[arg(long = "slug-hint")]
    slug_hint: Option<String>,
    /// Output encoding.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

/// Arguments to `aidd config show`.
#[derive(Debug, clap::Args)]
struct ConfigShowArgs {
    /// Output encoding.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

/// Dispatches one stage command and prints its structured outcome.
async fn command_dispatch(args: &DispatchArgs, ctx: &RuntimeContext) -> CliResult<ExitCode> {
    let start_dir = current_dir()?;
    let roots = resolve_roots(&start_dir)?;
    let gates_config = load_gates_config_or_default(&roots.workflow_root.join("config"))?;

    let request = DispatchRequest {
        host_hint: ctx.resolve_host(args.common.host.as_deref()),
        raw_command: args.command.clone(),
        ticket: args.common.ticket.clone().map(Ticket::from),
        slug_hint: args.common.slug_hint.clone().map(SlugHint::from),
        start_dir,
        branch: args.common.branch.clone(),
        changed_files: args.changed_files.clone(),
        entrypoint_args: args.args.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
        max_output_bytes: args.max_output_bytes,
        now: now(),
    };

    let outcome = dispatch_stage_command(&request, &gates_config).await?;
    let (view, code) = dispatch_report(outcome);
    print_value(&view, args.common.format)?;
    Ok(exit_code_from(code))
}

/// Structured rendering of a [`DispatchOutcome`], tagged by variant so
/// callers can branch on `outcome` without re-deriving `Serialize` on the
/// library type itself.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome")]
enum DispatchReport {
    /// A non-stage command (currently only `aidd-init-flow`) ran to
    /// completion.
    Ran {
        /// The entrypoint's exit code.
        exit_code: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
    /// Preflight blocked the stage before the entrypoint was launched.
    Blocked {
        /// Every gate result evaluated before the short-circuit.
        gate_results: Vec<GateResult>,
    },
    /// The entrypoint exited non-zero or timed out.
    EntrypointFailed {
        /// The entrypoint's exit code.
        exit_code: i32,
        /// Captured standard error.
        stderr: String,
        /// Whether the entrypoint was killed after exceeding its timeout.
        timed_out: bool,
    },
    /// The entrypoint exited zero and its stage result was loaded.
    Completed {
        /// The decoded stage result.
        stage_result: StageResult,
        /// Set when the result was recovered from a scope key other than
        /// the one expected.
        scope_mismatch: Option<ScopeKey>,
    },
}

/// Converts a [`DispatchOutcome`] into its [`DispatchReport`] rendering and
/// the process exit code it maps to, per the external interface contract's
/// dispatch exit codes (§6.1).
fn dispatch_report(outcome: DispatchOutcome) -> (DispatchReport, i32) {
    match outcome {
        DispatchOutcome::Ran { exit_code, stdout, stderr } => {
            let code = exit_code;
            (DispatchReport::Ran { exit_code, stdout, stderr }, code)
        }
        DispatchOutcome::Blocked { gate_results } => (DispatchReport::Blocked { gate_results }, 2),
        DispatchOutcome::EntrypointFailed { exit_code, stderr, timed_out } => {
            let code = if timed_out { 124 } else { exit_code };
            (DispatchReport::EntrypointFailed { exit_code, stderr, timed_out }, code)
        }
        DispatchOutcome::Completed { stage_result, scope_mismatch } => {
            let code = match stage_result.status {
                StageResultStatus::Done => 0,
                StageResultStatus::Continue => 10,
                StageResultStatus::Blocked => 20,
            };
            (DispatchReport::Completed { stage_result, scope_mismatch }, code)
        }
    }
}

/// Runs a loop to a terminal outcome and prints its structured result.
async fn command_loop_run(args: &LoopRunArgs, ctx: &RuntimeContext) -> CliResult<ExitCode> {
    let start_dir = current_dir()?;
    let roots = resolve_roots(&start_dir)?;
    let gates_config = load_gates_config_or_default(&roots.workflow_root.join("config"))?;

    let request = LoopRunRequest {
        host_hint: ctx.resolve_host(args.host.as_deref()),
        ticket: Ticket::from(args.ticket.clone()),
        start_dir,
        branch: args.branch.clone(),
        changed_files: args.changed_files.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
        max_output_bytes: args.max_output_bytes,
        max_iterations: args.max_iterations,
        from_qa: args.from_qa.map_or(QaRepairMode::None, QaRepairMode::from),
        work_item_key: args.work_item_key.clone(),
        select_qa_handoff: args.select_qa_handoff.clone(),
    };

    let outcome = run_loop(&request, &roots.workflow_root, &roots.workspace_root, &gates_config, now).await?;
    let code = outcome.exit_code();
    print_value(&loop_run_view(&outcome), args.format)?;
    Ok(exit_code_from(code))
}

/// Structured rendering of a [`LoopRunOutcome`].
#[derive(Debug, Serialize)]
#[serde(tag = "outcome")]
enum LoopRunView {
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

/// Converts a [`LoopRunOutcome`] into its display view.
fn loop_run_view(outcome: &LoopRunOutcome) -> LoopRunView {
    match outcome {
        LoopRunOutcome::Shipped => LoopRunView::Shipped,
        LoopRunOutcome::Blocked { reason_code } => LoopRunView::Blocked { reason_code: reason_code.clone() },
        LoopRunOutcome::MaxIterations => LoopRunView::MaxIterations,
        LoopRunOutcome::Error { message } => LoopRunView::Error { message: message.clone() },
    }
}

/// Dispatches exactly one implement or review iteration and prints its
/// structured result.
async fn command_loop_step(args: &LoopStepArgs, ctx: &RuntimeContext) -> CliResult<ExitCode> {
    let start_dir = current_dir()?;

    let request = LoopStepRequest {
        host_hint: ctx.resolve_host(args.host.as_deref()),
        stage: Stage::from(args.stage),
        ticket: Ticket::from(args.ticket.clone()),
        start_dir: start_dir.clone(),
        branch: args.branch.clone(),
        changed_files: args.changed_files.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
        max_output_bytes: args.max_output_bytes,
        now: now(),
    };
    let roots = resolve_roots(&start_dir)?;
    let gates_config = load_gates_config_or_default(&roots.workflow_root.join("config"))?;

    let outcome = run_loop_step(&request, &gates_config).await;
    let code = outcome.exit_code();
    print_value(&loop_step_view(&outcome), args.format)?;
    Ok(exit_code_from(code))
}

/// Structured rendering of a [`LoopStepOutcome`].
#[derive(Debug, Serialize)]
#[serde(tag = "outcome")]
enum LoopStepView {
    /// `review` shipped.
    Ship,
    /// `review` asked for another implement pass.
    Revise,
    /// The same stage should be dispatched again next iteration.
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

/// Converts a [`LoopStepOutcome`] into its display view.
fn loop_step_view(outcome: &LoopStepOutcome) -> LoopStepView {
    match outcome {
        LoopStepOutcome::Ship => LoopStepView::Ship,
        LoopStepOutcome::Revise => LoopStepView::Revise,
        LoopStepOutcome::Continue { stage } => LoopStepView::Continue { stage: *stage },
        LoopStepOutcome::Blocked { reason_code, message } => LoopStepView::Blocked { reason_code: reason_code.clone(), message: message.clone() },
        LoopStepOutcome::Error { message } => LoopStepView::Error { message: message.clone() },
    }
}

/// The JSON shape a `PreToolUse` payload is parsed from: the tool-call
/// fields flattened alongside a couple of hook-only extras no library
/// crate's [`HookContext`] carries.
#[derive(Debug, Deserialize)]
struct PreToolUsePayload {
    /// The tool-call fields proper.
    #[serde(flatten)]
    hook: HookContext,
    /// The stage the active workflow is currently on, when the caller's
    /// payload names it directly instead of relying on active-state
    /// lookup.
    #[serde(default)]
    stage: Option<String>,
    /// The size, in bytes, of the file at `hook.path`, when known.
    #[serde(default)]
    file_size: Option<u64>,
}

/// Decides a `PreToolUse` event and prints the decision.
fn command_hook_pre_tool_use(args: &PreToolUseArgs, ctx: &RuntimeContext) -> CliResult<ExitCode> {
    let payload_text = read_payload(args.payload.as_deref(), ctx)?;
    let payload: PreToolUsePayload = serde_json::from_str(&payload_text)?;

    let start_dir = current_dir()?;
    let roots = resolve_roots(&start_dir)?;
    let scope_key = ScopeKey::new(payload.hook.scope_key.clone());

    let stage = resolve_hook_stage(args.stage.as_deref(), payload.stage.as_deref(), &roots.workflow_root, &scope_key)?;
    let effective_boundaries = boundaries::load_effective_boundaries(&roots.workflow_root, &scope_key)?;

    let dependency_segments = if args.dependency_segments.is_empty() {
        DEFAULT_DEPENDENCY_SEGMENTS.iter().map(|segment| (*segment).to_string()).collect()
    } else {
        args.dependency_segments.clone()
    };
    let policy_config = PolicyConfig {
        mode: ctx.hooks_mode,
        dependency_segments,
        max_read_bytes: args.max_read_bytes,
        bash_output_guard_enabled: !args.no_bash_output_guard,
        tail_lines: args.tail_lines,
        log_dir: args.log_dir.clone(),
    };
    let log_marker = hook_log_marker();
    let request = PreToolUseRequest {
        hook: &payload.hook,
        stage,
        file_size: payload.file_size.or(args.file_size),
        log_marker: &log_marker,
    };

    let mut decision = decide_pre_tool_use(&policy_config, &effective_boundaries, &request);
    rate_limit_warning(&mut decision, &roots.workspace_root.join(&args.log_dir), &format!("pretooluse-{}", payload.hook.scope_key), args.min_warn_interval_secs);

    print_value(&PolicyDecisionView::from(decision), args.format)?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves the stage a `PreToolUse` decision is evaluated against: an
/// explicit `--stage` flag wins, then the payload's own `stage` field,
/// then the scope's active state.
///
/// # Errors
///
/// Returns [`CliError::UnresolvedHookStage`] when none of the three
/// sources names a stage.
fn resolve_hook_stage(flag: Option<&str>, payload: Option<&str>, workflow_root: &Path, scope_key: &ScopeKey) -> CliResult<Stage> {
    if let Some(name) = flag.or(payload) {
        return Ok(Stage::from_command(name)?);
    }
    let store = FileActiveStateStore::new(workflow_root.to_path_buf());
    store
        .load()?
        .and_then(|state| state.stage)
        .ok_or_else(|| CliError::UnresolvedHookStage(scope_key.as_str().to_string()))
}

/// Decides a `UserPromptSubmit` event and prints the decision.
fn command_hook_user_prompt_submit(args: &UserPromptSubmitArgs, ctx: &RuntimeContext) -> CliResult<ExitCode> {
    let start_dir = current_dir()?;
    let roots = resolve_roots(&start_dir)?;
    let context_gc = load_context_gc_config_or_default(&roots.workflow_root.join("config"))?;

    let used_tokens = match args.used_tokens {
        Some(tokens) => tokens,
        None => {
            let payload_text = read_payload(args.payload.as_deref(), ctx)?;
            let payload: ContextBudgetPayload = serde_json::from_str(&payload_text)?;
            payload.used_tokens
        }
    };
    let usage = ContextBudgetUsage {
        used_tokens,
        warn_token_budget: args.warn_token_budget.unwrap_or(u64::from(context_gc.warn_token_budget)),
        hard_token_budget: args.hard_token_budget.unwrap_or(u64::from(context_gc.hard_token_budget)),
    };

    let mut decision = decide_user_prompt_submit(ctx.hooks_mode, usage);
    rate_limit_warning(&mut decision, &roots.workspace_root.join(&args.log_dir), "context-budget", args.min_warn_interval_secs);

    print_value(&PolicyDecisionView::from(decision), args.format)?;
    Ok(ExitCode::SUCCESS)
}

/// The JSON shape a `UserPromptSubmit` payload is parsed from when
/// `--used-tokens` is not given directly.
#[derive(Debug, Deserialize)]
struct ContextBudgetPayload {
    /// Approximate tokens consumed by the transcript so far.
    used_tokens: u64,
}

/// Suppresses a warning-class [`PolicyDecision`]'s message when `guard`'s
/// rate-limiting stamp says it fired too recently, and records a fresh
/// stamp whenever the message is allowed through.
///
/// Only [`Decision::Allow`] decisions are rate-limited: an `Ask`/`Deny`
/// must keep surfacing its message every time, since those decisions are
/// not silent warnings but the host's signal to confirm or refuse the
/// call.
fn rate_limit_warning(decision: &mut PolicyDecision, log_dir: &Path, guard: &str, min_interval_secs: u64) {
    if decision.decision != Decision::Allow || decision.message.is_none() {
        return;
    }
    let path = stamp_path(log_dir, guard);
    let now_secs = epoch_seconds();
    if should_emit(&path, min_interval_secs, now_secs) {
        let _ = write_stamp(&path, now_secs);
    } else {
        decision.message = None;
    }
}

/// Returns the current time as whole seconds since the Unix epoch,
/// saturating to zero if the system clock reads before it.
fn epoch_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |duration| duration.as_secs())
}

/// A token distinguishing one bash-output-guard log file from another
/// within the same run, derived from the current time rather than a
/// counter so repeated CLI invocations do not collide.
fn hook_log_marker() -> String {
    epoch_seconds().to_string()
}

/// Serializable rendering of a [`PolicyDecision`], since the library type
/// itself intentionally carries no `Serialize` impl (its `Decision` enum
/// has no canonical wire spelling of its own).
#[derive(Debug, Serialize)]
struct PolicyDecisionView {
    /// `allow`, `ask`, or `deny`.
    decision: &'static str,
    /// A human-readable message, present whenever `decision` is not a
    /// silent allow.
    message: Option<String>,
    /// A rewritten tool input, present only when the original input was
    /// replaced.
    updated_input: Option<String>,
}

impl From<PolicyDecision> for PolicyDecisionView {
    fn from(decision: PolicyDecision) -> Self {
        let label = match decision.decision {
            Decision::Allow => "allow",
            Decision::Ask => "ask",
            Decision::Deny => "deny",
        };
        Self { decision: label, message: decision.message, updated_input: decision.updated_input }
    }
}

/// Reads a hook payload from, in priority order: an explicit flag, the
/// runtime context's `HOOK_PAYLOAD`/`AIDD_HOOK_PAYLOAD` snapshot, or
/// stdin.
///
/// # Errors
///
/// Returns [`CliError::MissingHookPayload`] when none of the three
/// sources supplies a payload, or [`CliError::Io`] when stdin cannot be
/// read.
fn read_payload(flag: Option<&str>, ctx: &RuntimeContext) -> CliResult<String> {
    use std::io::IsTerminal as _;
    use std::io::Read as _;

    if let Some(payload) = flag {
        return Ok(payload.to_string());
    }
    if let Some(payload) = &ctx.hook_payload {
        return Ok(payload.clone());
    }
    if std::io::stdin().is_terminal() {
        return Err(CliError::MissingHookPayload);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    if buf.trim().is_empty() {
        return Err(CliError::MissingHookPayload);
    }
    Ok(buf)
}

/// Shows the active workflow state for a ticket, falling back to whatever
/// ticket is recorded in the workflow root's single active-state document.
fn command_status(args: &StatusArgs, ctx: &RuntimeContext) -> CliResult<ExitCode> {
    let start_dir = current_dir()?;
    let roots = resolve_roots(&start_dir)?;

    let store = FileActiveStateStore::new(roots.workflow_root.clone());
    let state = store.load()?;

    let ticket = args
        .ticket
        .clone()
        .map(Ticket::from)
        .or_else(|| state.as_ref().and_then(|s| s.ticket.clone()));
    let Some(ticket) = ticket else {
        return Err(CliError::NoActiveScope);
    };
    let work_item = state.as_ref().and_then(|s| s.work_item.as_deref());
    let scope_key = resolve_scope_key(work_item, &ticket);

    let mut value = match &state {
        Some(state) => serde_json::to_value(state)?,
        None => serde_json::json!({ "ticket": ticket.as_str(), "active": false }),
    };
    if let Some(object) = value.as_object_mut() {
        object.insert("scope_key".to_string(), serde_json::Value::String(scope_key.as_str().to_string()));
        if let Some(slug_hint) = &args.slug_hint {
            object.insert("slug_hint".to_string(), serde_json::Value::String(slug_hint.clone()));
        }
    }
    if let Some(override_stage) = &ctx.active_stage_override
        && let Some(object) = value.as_object_mut()
    {
        object.insert("stage".to_string(), serde_json::Value::String(override_stage.clone()));
    }

    print_value(&value, args.format)?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the loaded gate, context-GC, and convention thresholds.
fn command_config_show(args: &ConfigShowArgs) -> CliResult<ExitCode> {
    let start_dir = current_dir()?;
    let roots = resolve_roots(&start_dir)?;
    let config_dir = roots.workflow_root.join("config");

    let view = ConfigShowView {
        workflow_root: roots.workflow_root.clone(),
        gates: load_optional_config(aidd_config::load_gates_config(&config_dir))?,
        context_gc: load_optional_config(aidd_config::load_context_gc_config(&config_dir))?,
        conventions: load_optional_config(aidd_config::load_conventions_config(&config_dir))?,
    };
    print_value(&view, args.format)?;
    Ok(ExitCode::SUCCESS)
}

/// The structured result `aidd config show` prints.
#[derive(Debug, Serialize)]
struct ConfigShowView {
    /// The workflow root these config files were loaded from.
    workflow_root: PathBuf,
    /// `config/gates.json`, when present.
    gates: Option<aidd_config::GatesConfig>,
    /// `config/context_gc.json`, when present.
    context_gc: Option<aidd_config::ContextGcConfig>,
    /// `config/conventions.json`, when present.
    conventions: Option<aidd_config::ConventionsConfig>,
}

/// Converts a missing-file [`aidd_config::ConfigError`] into `Ok(None)`,
/// propagating every other failure (oversized, malformed, out-of-range).
fn load_optional_config<T>(result: Result<T, aidd_config::ConfigError>) -> CliResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(aidd_config::ConfigError::Io(_, source)) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(CliError::from(err)),
    }
}

/// Loads `config/gates.json` under `config_dir`, falling back to
/// [`default_gates_config`] when the file does not yet exist.
fn load_gates_config_or_default(config_dir: &Path) -> CliResult<aidd_config::GatesConfig> {
    load_optional_config(aidd_config::load_gates_config(config_dir)).map(|config| config.unwrap_or_else(default_gates_config))
}

/// Loads `config/context_gc.json` under `config_dir`, falling back to
/// [`DEFAULT_WARN_TOKEN_BUDGET`]/[`DEFAULT_HARD_TOKEN_BUDGET`] when the
/// file does not yet exist.
fn load_context_gc_config_or_default(config_dir: &Path) -> CliResult<aidd_config::ContextGcConfig> {
    load_optional_config(aidd_config::load_context_gc_config(config_dir))
        .map(|config| config.unwrap_or(aidd_config::ContextGcConfig { warn_token_budget: DEFAULT_WARN_TOKEN_BUDGET, hard_token_budget: DEFAULT_HARD_TOKEN_BUDGET }))
}

/// Returns the current time, stamped onto active-state writes and stage
/// results this binary produces.
fn now() -> Timestamp {
    Timestamp::from_offset(time::OffsetDateTime::now_utc())
}

/// Returns the process's current working directory.
fn current_dir() -> CliResult<PathBuf> {
    Ok(std::env::current_dir()?)
}

/// Renders `value` in `format` and writes it to stdout.
fn print_value<T: Serialize>(value: &T, format: OutputFormat) -> CliResult<()> {
    let text = render(value, format)?;
    write_stdout_line(&text)
}

/// Writes `line` to stdout followed by a newline, without going through
/// the `println!` macro this workspace's lints deny.
fn write_stdout_line(line: &str) -> CliResult<()> {
    use std::io::Write as _;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    Ok(())
}

/// Writes `line` to stderr followed by a newline, without going through
/// the `eprintln!` macro this workspace's lints deny.
fn write_stderr_line(line: &str) {
    use std::io::Write as _;
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{line}");
}

/// Renders an uncaught error to stderr as a single `[aidd] ERROR: ...`
/// line, or the error's full `Debug` form when `debug` is set, per the
/// external interface contract's `AIDD_DEBUG` behavior (§6.3, §7).
#[allow(clippy::use_debug, reason = "AIDD_DEBUG opts into verbose error rendering for diagnostics")]
fn emit_error(err: &CliError, debug: bool) {
    if debug {
        write_stderr_line(&format!("[aidd] ERROR: {err:?}"));
    } else {
        write_stderr_line(&format!("[aidd] ERROR: {err}"));
    }
}

/// Converts a signed process exit code into an [`ExitCode`], clamping any
/// out-of-range value to `1` rather than truncating it silently.
fn exit_code_from(code: i32) -> ExitCode {
    u8::try_from(code.clamp(0, i32::from(u8::MAX))).map_or(ExitCode::FAILURE, ExitCode::from)
}

/// Every way an `aidd` invocation can fail before a command-specific exit
/// code takes over.
#[derive(Debug, Error)]
enum CliError {
    /// An I/O operation failed (reading stdin, the working directory, a
    /// config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A hook payload or stage result could not be decoded as JSON.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
    /// Structured output could not be rendered.
    #[error(transparent)]
    Output(#[from] output::OutputError),
    /// Workspace/workflow roots could not be resolved.
    #[error(transparent)]
    Roots(#[from] aidd_core::RootsError),
    /// Active state could not be read or written.
    #[error(transparent)]
    ActiveState(#[from] aidd_core::ActiveStateError),
    /// A stage name could not be parsed.
    #[error(transparent)]
    Stage(#[from] aidd_core::StageParseError),
    /// A persisted config file could not be loaded.
    #[error(transparent)]
    Config(#[from] aidd_config::ConfigError),
    /// A readmap, writemap, or loop pack could not be loaded.
    #[error(transparent)]
    MapLoad(#[from] aidd_hooks::MapLoadError),
    /// A full stage dispatch failed.
    #[error(transparent)]
    Dispatch(#[from] aidd_dispatch::DispatchError),
    /// A loop run could not be started or persisted.
    #[error(transparent)]
    LoopRun(#[from] aidd_loop::LoopRunError),
    /// A `PreToolUse`/`UserPromptSubmit` hook was invoked with no payload
    /// available from a flag, the environment, or stdin.
    #[error("no hook payload was given via --payload, HOOK_PAYLOAD/AIDD_HOOK_PAYLOAD, or stdin")]
    MissingHookPayload,
    /// `aidd hook pre-tool-use` could not resolve which stage to evaluate
    /// against.
    #[error("no --stage given and no active state found for scope {0}")]
    UnresolvedHookStage(String),
    /// `aidd status` was invoked with no `--ticket` and no last-dispatched
    /// scope was recorded.
    #[error("no --ticket given and no workflow has been dispatched yet")]
    NoActiveScope,
}

/// Convenience alias for this binary's fallible command handlers.
type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Returns the process exit code this error maps to, per the external
    /// interface contract's error-handling design (§7): configuration and
    /// validation failures exit `2`; everything that ran further before
    /// failing (state I/O, the command runner, a loop run) exits `30`.
    const fn exit_code(&self) -> i32 {
        match self {
            Self::Roots(_)
            | Self::Stage(_)
            | Self::Config(_)
            | Self::Dispatch(aidd_dispatch::DispatchError::UnknownCommand(_) | aidd_dispatch::DispatchError::MissingTicket(_))
            | Self::MissingHookPayload
            | Self::UnresolvedHookStage(_)
            | Self::NoActiveScope => 2,
            Self::Io(_) | Self::Json(_) | Self::Output(_) | Self::ActiveState(_) | Self::MapLoad(_) | Self::Dispatch(_) | Self::LoopRun(_) => 30,
        }
    }
}
