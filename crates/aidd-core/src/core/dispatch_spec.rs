// crates/aidd-core/src/core/dispatch_spec.rs
// ============================================================================
// Module: Dispatch Spec Entity
// Description: The static description of how a canonical command maps to a
//   stage entrypoint.
// Purpose: Decouple the dispatcher from the static dispatch table, which
//   lives in `aidd-config`.
// Dependencies: aidd-core::core::stage, serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::stage::Stage;

/// How a canonical command is launched.
///
/// # Invariants
/// - `requires_workflow` is `false` only for commands that run before a
///   workflow root exists (currently only `aidd-init-flow`); when `false`,
///   the dispatcher's preflight step is unconditionally skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSpec {
    /// The canonical command name this spec describes.
    pub command: String,
    /// The pipeline stage this command corresponds to, if any.
    pub stage: Option<Stage>,
    /// The entrypoint executable or script to launch.
    pub entrypoint: String,
    /// Arguments passed to the entrypoint ahead of dispatcher-supplied ones.
    pub args: Vec<String>,
    /// Whether this command requires an existing workflow root and runs
    /// preflight gates.
    pub requires_workflow: bool,
    /// Whether a ticket is required to dispatch this command.
    pub ticket_required: bool,
    /// Whether the resolved ticket is injected as a `--ticket` flag.
    pub inject_ticket_flag: bool,
    /// Whether dispatching this command updates the active state's ticket.
    pub set_feature: bool,
    /// Whether dispatching this command updates the active state's stage.
    pub set_stage: bool,
}

/// The result of resolving a raw, possibly host-prefixed or legacy-aliased
/// command name to its canonical [`DispatchSpec`].
///
/// # Invariants
/// - `is_legacy_alias` is `true` exactly when `resolved_command` differs
///   from `requested_command` (the already host-stripped, separator-
///   collapsed name dispatch was asked for).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTarget {
    /// The command name exactly as the caller supplied it.
    pub raw_command: String,
    /// `raw_command` after host-prefix stripping and separator collapsing,
    /// before legacy-alias resolution.
    pub requested_command: String,
    /// The canonical command name the spec is keyed on.
    pub resolved_command: String,
    /// Whether `requested_command` was a legacy alias rather than already
    /// canonical.
    pub is_legacy_alias: bool,
    /// The resolved command's dispatch spec.
    pub spec: DispatchSpec,
}
