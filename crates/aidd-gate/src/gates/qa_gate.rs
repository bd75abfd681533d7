// crates/aidd-gate/src/gates/qa_gate.rs
// ============================================================================
// Module: QA Gate
// Description: Verifies the review artifact shipped before QA starts.
// Purpose: Guard the `qa` stage's preflight.
// Dependencies: aidd-core, aidd-gate::markdown
// ============================================================================

use std::fs;

use aidd_core::GateResult;

use crate::context::GateContext;
use crate::gate::Gate;
use crate::markdown::extract_front_matter;

/// Front-matter verdict value that allows QA to proceed.
const SHIP_VERDICT: &str = "ship";

/// Verifies `reports/review/<scope>/review.md` carries a `ship` verdict.
#[derive(Debug, Default, Clone, Copy)]
pub struct QaGate;

impl Gate for QaGate {
    fn name(&self) -> &'static str {
        "qa_gate"
    }

    fn run(&self, ctx: &GateContext) -> GateResult {
        let path = ctx.report_dir("review").join("review.md");
        let Ok(text) = fs::read_to_string(&path) else {
            return GateResult::blocked(self.name(), format!("missing review artifact at {}", path.display()));
        };
        let fields = extract_front_matter(&text);
        match fields.get("verdict").map(String::as_str) {
            Some(SHIP_VERDICT) => GateResult::ok(self.name()),
            Some(other) => GateResult::blocked(self.name(), format!("review verdict is {other:?}, not {SHIP_VERDICT:?}")),
            None => GateResult::blocked(self.name(), "review artifact is missing a verdict field".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QaGate;
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
            stage: Stage::Qa,
            branch: None,
            changed_files: Vec::new(),
        }
    }

    #[test]
    fn blocks_on_a_revise_verdict() {
        let root = tempdir().expect("tempdir");
        let dir = root.path().join("reports/review/AIDD-1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("review.md"), "---\nverdict: revise\n---\n").expect("writes");

        let result = QaGate.run(&ctx(root.path()));
        assert_eq!(result.status, GateStatus::Blocked);
    }

    #[test]
    fn passes_on_a_ship_verdict() {
        let root = tempdir().expect("tempdir");
        let dir = root.path().join("reports/review/AIDD-1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("review.md"), "---\nverdict: ship\n---\n").expect("writes");

        let result = QaGate.run(&ctx(root.path()));
        assert_eq!(result.status, GateStatus::Ok);
    }
}
