// crates/aidd-gate/src/gates/prd_review_gate.rs
// ============================================================================
// Module: PRD Review Gate
// Description: Verifies the spec review artifact has been marked approved
//   before tasklist generation starts.
// Purpose: Guard the `tasks-new` stage's preflight.
// Dependencies: aidd-core, aidd-gate::markdown
// ============================================================================

use std::fs;

use aidd_core::GateResult;

use crate::context::GateContext;
use crate::gate::Gate;
use crate::markdown::extract_front_matter;

/// Front-matter status value that allows tasklist generation to proceed.
const APPROVED_STATUS: &str = "approved";

/// Verifies `reports/review-spec/<scope>/review.md` is marked approved.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrdReviewGate;

impl Gate for PrdReviewGate {
    fn name(&self) -> &'static str {
        "prd_review_gate"
    }

    fn run(&self, ctx: &GateContext) -> GateResult {
        let path = ctx.report_dir("review-spec").join("review.md");
        let Ok(text) = fs::read_to_string(&path) else {
            return GateResult::blocked(self.name(), format!("missing spec review artifact at {}", path.display()));
        };
        let fields = extract_front_matter(&text);
        match fields.get("status").map(String::as_str) {
            Some(APPROVED_STATUS) => GateResult::ok(self.name()),
            Some(other) => GateResult::blocked(self.name(), format!("spec review status is {other:?}, not {APPROVED_STATUS:?}")),
            None => GateResult::blocked(self.name(), "spec review artifact is missing a status field".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PrdReviewGate;
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
            stage: Stage::Tasklist,
            branch: None,
            changed_files: Vec::new(),
        }
    }

    #[test]
    fn blocks_on_unapproved_status() {
        let root = tempdir().expect("tempdir");
        let dir = root.path().join("reports/review-spec/AIDD-1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("review.md"), "---\nstatus: pending\n---\n").expect("writes");

        let result = PrdReviewGate.run(&ctx(root.path()));
        assert_eq!(result.status, aidd_core::GateStatus::Blocked);
    }

    #[test]
    fn passes_on_approved_status() {
        let root = tempdir().expect("tempdir");
        let dir = root.path().join("reports/review-spec/AIDD-1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("review.md"), "---\nstatus: approved\n---\n").expect("writes");

        let result = PrdReviewGate.run(&ctx(root.path()));
        assert_eq!(result.status, aidd_core::GateStatus::Ok);
    }
}
