// crates/aidd-gate/src/gates/tasklist_check.rs
// ============================================================================
// Module: Tasklist Check Gate
// Description: Verifies the tasklist artifact has a contiguous, non-empty
//   numbered list before implementation starts.
// Purpose: Guard the `implement` stage's preflight.
// Dependencies: aidd-core, aidd-gate::markdown
// ============================================================================

use std::fs;

use aidd_core::GateResult;

use crate::context::GateContext;
use crate::gate::Gate;
use crate::markdown::has_contiguous_numbered_list;

/// Verifies `reports/tasklist/<scope>/tasklist.md` has a contiguous
/// numbered task list.
#[derive(Debug, Default, Clone, Copy)]
pub struct TasklistCheck;

impl Gate for TasklistCheck {
    fn name(&self) -> &'static str {
        "tasklist_check"
    }

    fn run(&self, ctx: &GateContext) -> GateResult {
        let path = ctx.report_dir("tasklist").join("tasklist.md");
        let Ok(text) = fs::read_to_string(&path) else {
            return GateResult::blocked(self.name(), format!("missing tasklist artifact at {}", path.display()));
        };
        if !has_contiguous_numbered_list(&text) {
            return GateResult::blocked(self.name(), "tasklist has no contiguous numbered task list".to_string());
        }
        GateResult::ok(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::TasklistCheck;
    use crate::context::GateContext;
    use crate::gate::Gate;
    use aidd_core::GateStatus;
    use aidd_core::ScopeKey;
    use aidd_core::Stage;
    use aidd_core::Ticket;
    use std::fs;
    use tempfile::tempdir;

    fn ctx(root: &std::path::Path) -> GateContext {
        GateContext {
            workspace_root: root.to_path_buf(),
            ticket: Ticket::from("AIDD-1"),
            scope_key: ScopeKey::from("AIDD-1"),
            stage: Stage::Implement,
            branch: None,
            changed_files: Vec::new(),
        }
    }

    #[test]
    fn blocks_on_an_empty_tasklist() {
        let root = tempdir().expect("tempdir");
        let dir = root.path().join("reports/tasklist/AIDD-1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("tasklist.md"), "# Tasklist\nnothing numbered\n").expect("writes");

        let result = TasklistCheck.run(&ctx(root.path()));
        assert_eq!(result.status, GateStatus::Blocked);
    }

    #[test]
    fn passes_with_a_contiguous_tasklist() {
        let root = tempdir().expect("tempdir");
        let dir = root.path().join("reports/tasklist/AIDD-1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("tasklist.md"), "1. first\n2. second\n").expect("writes");

        let result = TasklistCheck.run(&ctx(root.path()));
        assert_eq!(result.status, GateStatus::Ok);
    }
}
