// crates/aidd-gate/src/gates/diff_boundary_check.rs
// ============================================================================
// Module: Diff Boundary Check Gate
// Description: Verifies every changed file falls within the scope's allowed
//   path boundaries before review starts.
// Purpose: Guard the `review` stage's preflight.
// Dependencies: aidd-core::core::pathglob
// ============================================================================

use aidd_core::GateResult;
use aidd_core::core::pathglob::any_matches;

use crate::context::GateContext;
use crate::gate::Gate;

/// Path globs every implement pass is allowed to touch, by default.
const DEFAULT_ALLOWED_GLOBS: [&str; 2] = ["src/**", "tests/**"];

/// Verifies every path in `ctx.changed_files` matches at least one allowed
/// glob.
pub struct DiffBoundaryCheck {
    /// Path globs changed files are allowed to match.
    allowed_globs: Vec<String>,
}

impl DiffBoundaryCheck {
    /// Builds the gate with an explicit set of allowed path globs.
    #[must_use]
    pub fn new(allowed_globs: Vec<String>) -> Self {
        Self { allowed_globs }
    }
}

impl Default for DiffBoundaryCheck {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_GLOBS.iter().map(|s| (*s).to_string()).collect())
    }
}

impl Gate for DiffBoundaryCheck {
    fn name(&self) -> &'static str {
        "diff_boundary_check"
    }

    fn run(&self, ctx: &GateContext) -> GateResult {
        if ctx.changed_files.is_empty() {
            return GateResult::skipped(self.name(), "no changed files to check");
        }
        for changed in &ctx.changed_files {
            let candidate = changed.to_string_lossy();
            if !any_matches(self.allowed_globs.iter().map(String::as_str), &candidate) {
                return GateResult::blocked(self.name(), format!("{candidate} is outside the allowed diff boundary"));
            }
        }
        GateResult::ok(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::DiffBoundaryCheck;
    use crate::context::GateContext;
    use crate::gate::Gate;
    use aidd_core::GateStatus;
    use aidd_core::ScopeKey;
    use aidd_core::Stage;
    use aidd_core::Ticket;
    use std::path::PathBuf;

    fn ctx(changed_files: Vec<PathBuf>) -> GateContext {
        GateContext {
            workspace_root: PathBuf::from("/workspace"),
            ticket: Ticket::from("AIDD-1"),
            scope_key: ScopeKey::from("AIDD-1"),
            stage: Stage::Review,
            branch: None,
            changed_files,
        }
    }

    #[test]
    fn skips_when_there_are_no_changed_files() {
        let result = DiffBoundaryCheck::default().run(&ctx(Vec::new()));
        assert_eq!(result.status, GateStatus::Skipped);
    }

    #[test]
    fn passes_when_every_change_is_in_bounds() {
        let result = DiffBoundaryCheck::default().run(&ctx(vec![PathBuf::from("src/lib.rs")]));
        assert_eq!(result.status, GateStatus::Ok);
    }

    #[test]
    fn blocks_on_an_out_of_bounds_change() {
        let result = DiffBoundaryCheck::default().run(&ctx(vec![PathBuf::from("Cargo.toml")]));
        assert_eq!(result.status, GateStatus::Blocked);
    }
}
