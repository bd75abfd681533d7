// crates/aidd-core/src/lib.rs
// ============================================================================
// Module: AIDD Core
// Description: Shared entities, identifiers, and pure helpers for the stage
//   dispatch and gate engine.
// Purpose: Give every other aidd-* crate a single, dependency-free source of
//   truth for the data model described by the workflow's persisted artifacts.
// Dependencies: serde, serde_json, regex, time, thiserror
// ============================================================================

//! ## Overview
//! `aidd-core` has no knowledge of subprocesses, gates, or CLI surfaces; it
//! only models the records that flow between those layers (active state,
//! stage results, scope keys, host profiles, dispatch specs) and a handful of
//! pure functions (`resolve_scope_key`, path globbing, root discovery) that
//! every other crate needs and that are cheap to unit test in isolation.

pub mod core;
pub mod interfaces;

pub use core::active_state::{
    ActiveState, ActiveStateError, FileActiveStateStore, active_state_path, normalize_slug_hint_token, write_active_state,
    write_identifiers,
};
pub use core::dispatch_spec::{DispatchSpec, DispatchTarget};
pub use core::gate_result::{GateResult, GateStatus};
pub use core::hook_context::{HookContext, ToolName};
pub use core::host_profile::HostProfile;
pub use core::ids::{HandoffId, IterationId, ReportId, ScopeKey, SlugHint, Ticket};
pub use core::roots::{RootsError, WorkflowRoots, resolve_roots};
pub use core::scope::resolve_scope_key;
pub use core::stage::{Stage, StageParseError, Verdict, is_iteration_work_item_key, is_valid_work_item_key, normalize_work_item_for_stage};
pub use core::stage_result::{STAGE_RESULT_SCHEMA, StageResult, StageResultStatus};
pub use core::time::Timestamp;
pub use interfaces::ActiveStateStore;
