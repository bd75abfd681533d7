// crates/aidd-dispatch/src/target.rs
// ============================================================================
// Module: Dispatch Target Resolution
// Description: Resolves a raw CLI command, under a given host hint, to a
//   dispatch spec.
// Purpose: Combine host-prefix stripping and legacy-alias normalization
//   into one lookup the dispatcher calls once.
// Dependencies: aidd-config, aidd-core
// ============================================================================

use aidd_config::DispatchTableError;
use aidd_config::resolve_dispatch_target;
use aidd_config::resolve_profile;
use aidd_core::DispatchTarget;
use aidd_core::HostProfile;

/// Resolves `raw_command` under `host_hint` to its [`HostProfile`] and
/// [`DispatchTarget`].
///
/// # Errors
///
/// Returns [`DispatchTableError`] when the (host-prefix-stripped,
/// alias-normalized) command does not match any canonical command.
pub fn resolve_target(host_hint: &str, raw_command: &str) -> Result<(HostProfile, DispatchTarget), DispatchTableError> {
    let (profile, bare_command) = resolve_profile(host_hint, raw_command);
    let target = resolve_dispatch_target(raw_command, bare_command)?;
    Ok((profile, target))
}

#[cfg(test)]
mod tests {
    use super::resolve_target;

    #[test]
    fn strips_host_prefix_before_resolving_the_spec() {
        let (profile, target) = resolve_target("codex", "codex:research").expect("resolves");
        assert_eq!(profile.name, "codex");
        assert_eq!(target.resolved_command, "researcher");
    }

    #[test]
    fn normalizes_legacy_aliases_after_stripping_a_prefix() {
        let (_, target) = resolve_target("codex", "codex:aidd-plan-flow").expect("resolves");
        assert_eq!(target.resolved_command, "plan-new");
        assert!(target.is_legacy_alias);
    }
}
