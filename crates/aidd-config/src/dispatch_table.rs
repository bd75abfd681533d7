// crates/aidd-config/src/dispatch_table.rs
// ============================================================================
// Module: Dispatch Spec Table
// Description: The canonical command table and the legacy alias table that
//   normalizes older command spellings onto it.
// Purpose: Give the dispatcher one place to look up how a command name maps
//   to a stage entrypoint.
// Dependencies: aidd-core, thiserror
// ============================================================================

//! ## Overview
//! Both tables are compiled in rather than loaded from disk: the command set
//! is small, closed, and changes only when this crate is rebuilt (Design
//! Note "Dynamic dispatch tables → static tables"). [`normalize_command_name`]
//! is applied before table lookup so legacy scripts that still invoke an old
//! command spelling keep working.

use thiserror::Error;

use aidd_core::DispatchSpec;
use aidd_core::DispatchTarget;
use aidd_core::Stage;

/// `(legacy name, canonical name)` pairs, checked in order.
const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("aidd-idea-flow", "idea-new"),
    ("aidd-research-flow", "researcher"),
    ("aidd-plan-flow", "plan-new"),
    ("aidd-implement-flow", "implement"),
    ("aidd-review-flow", "review"),
    ("aidd-qa-flow", "qa"),
    ("aidd-init", "aidd-init-flow"),
];

/// Normalizes `raw` to its canonical command name via the legacy alias
/// table, leaving already-canonical or unrecognized names unchanged.
///
/// # Invariants
/// - Idempotent: normalizing an already-canonical name returns it unchanged,
///   since canonical names never themselves appear as alias sources.
#[must_use]
pub fn normalize_command_name(raw: &str) -> String {
    LEGACY_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == raw)
        .map_or_else(|| raw.to_string(), |(_, canonical)| (*canonical).to_string())
}

/// Builds the dispatch spec for canonical command `name`.
fn spec_for(name: &str) -> Option<DispatchSpec> {
    let (stage, entrypoint, requires_workflow) = match name {
        "aidd-init-flow" => (None, "scripts/aidd-init-flow.sh", false),
        "idea-new" => (Some(Stage::Idea), "scripts/stages/idea.sh", true),
        "researcher" => (Some(Stage::Research), "scripts/stages/research.sh", true),
        "plan-new" => (Some(Stage::Plan), "scripts/stages/plan.sh", true),
        "review-spec" => (Some(Stage::ReviewSpec), "scripts/stages/review_spec.sh", true),
        "spec-interview" => (Some(Stage::SpecInterview), "scripts/stages/spec_interview.sh", true),
        "tasks-new" => (Some(Stage::Tasklist), "scripts/stages/tasklist.sh", true),
        "implement" => (Some(Stage::Implement), "scripts/stages/implement.sh", true),
        "review" => (Some(Stage::Review), "scripts/stages/review.sh", true),
        "qa" => (Some(Stage::Qa), "scripts/stages/qa.sh", true),
        _ => return None,
    };
    let ticket_required = name != "aidd-init-flow";
    Some(DispatchSpec {
        command: name.to_string(),
        stage,
        entrypoint: entrypoint.to_string(),
        args: Vec::new(),
        requires_workflow,
        ticket_required,
        inject_ticket_flag: ticket_required,
        set_feature: ticket_required,
        set_stage: ticket_required,
    })
}

/// Resolves `requested_command` (already host-prefix-stripped) to its
/// dispatch target, normalizing legacy aliases along the way. `raw_command`
/// is carried through unchanged for display/logging purposes only.
///
/// # Errors
///
/// Returns [`DispatchTableError::UnknownCommand`] when neither
/// `requested_command` nor its normalized form is a canonical command.
pub fn resolve_dispatch_target(raw_command: &str, requested_command: &str) -> Result<DispatchTarget, DispatchTableError> {
    let resolved_command = normalize_command_name(requested_command);
    let spec = spec_for(&resolved_command).ok_or_else(|| DispatchTableError::UnknownCommand(requested_command.to_string()))?;
    Ok(DispatchTarget {
        raw_command: raw_command.to_string(),
        requested_command: requested_command.to_string(),
        is_legacy_alias: resolved_command != requested_command,
        resolved_command,
        spec,
    })
}

/// Failure resolving a command to a dispatch spec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchTableError {
    /// `0` does not match any canonical command or legacy alias.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

#[cfg(test)]
mod tests {
    use super::normalize_command_name;
    use super::resolve_dispatch_target;

    #[test]
    fn legacy_alias_normalizes_to_canonical_name() {
        assert_eq!(normalize_command_name("aidd-research-flow"), "researcher");
    }

    #[test]
    fn canonical_name_is_unchanged_by_normalization() {
        assert_eq!(normalize_command_name("researcher"), "researcher");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_command_name("aidd-plan-flow");
        let twice = normalize_command_name(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn resolves_legacy_alias_end_to_end() {
        let target = resolve_dispatch_target("/flow:aidd-plan-flow", "aidd-plan-flow").expect("resolves");
        assert_eq!(target.resolved_command, "plan-new");
        assert!(target.is_legacy_alias);
    }

    #[test]
    fn canonical_command_is_not_flagged_as_a_legacy_alias() {
        let target = resolve_dispatch_target("plan-new", "plan-new").expect("resolves");
        assert_eq!(target.resolved_command, "plan-new");
        assert!(!target.is_legacy_alias);
    }

    #[test]
    fn aidd_init_flow_does_not_require_a_workflow() {
        let target = resolve_dispatch_target("aidd-init", "aidd-init").expect("resolves");
        assert!(!target.spec.requires_workflow);
        assert!(!target.spec.ticket_required);
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(resolve_dispatch_target("bogus", "bogus").is_err());
    }
}
