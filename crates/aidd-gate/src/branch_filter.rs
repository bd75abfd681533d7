// crates/aidd-gate/src/branch_filter.rs
// ============================================================================
// Module: Branch Filter
// Description: Glob-based allow/skip matching for preflight gates.
// Purpose: Let a workflow exempt certain branches (e.g. `docs/**`) from
//   preflight gates entirely.
// Dependencies: aidd-core::core::pathglob
// ============================================================================

use aidd_core::core::pathglob::any_matches;

/// Returns whether `branch` matches any glob in `skip_globs`, meaning
/// preflight gates should be skipped for this invocation.
#[must_use]
pub fn branch_is_exempt(branch: Option<&str>, skip_globs: &[String]) -> bool {
    let Some(branch) = branch else {
        return false;
    };
    any_matches(skip_globs.iter().map(String::as_str), branch)
}

#[cfg(test)]
mod tests {
    use super::branch_is_exempt;

    #[test]
    fn matches_an_exempt_branch_glob() {
        let globs = vec!["docs/**".to_string()];
        assert!(branch_is_exempt(Some("docs/readme-fix"), &globs));
    }

    #[test]
    fn does_not_exempt_a_non_matching_branch() {
        let globs = vec!["docs/**".to_string()];
        assert!(!branch_is_exempt(Some("feature/new-gate"), &globs));
    }

    #[test]
    fn no_branch_is_never_exempt() {
        let globs = vec!["**".to_string()];
        assert!(!branch_is_exempt(None, &globs));
    }
}
