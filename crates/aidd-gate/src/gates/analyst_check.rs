// crates/aidd-gate/src/gates/analyst_check.rs
// ============================================================================
// Module: Analyst Check Gate
// Description: Verifies that idea intake has enough answered questions
//   before research starts.
// Purpose: Guard the `research` stage's preflight.
// Dependencies: aidd-core, aidd-gate::markdown
// ============================================================================

use std::fs;

use aidd_core::GateResult;

use crate::context::GateContext;
use crate::gate::Gate;
use crate::markdown::count_answered_questions;

/// Minimum number of answered intake questions required before research can
/// begin.
const MIN_ANSWERED_QUESTIONS: u32 = 1;

/// Verifies `reports/idea/<scope>/idea.md` has enough answered questions.
pub struct AnalystCheck {
    /// Minimum answered-question count required.
    min_answered: u32,
}

impl AnalystCheck {
    /// Builds the gate with the given minimum answered-question count.
    #[must_use]
    pub const fn new(min_answered: u32) -> Self {
        Self { min_answered }
    }
}

impl Default for AnalystCheck {
    fn default() -> Self {
        Self::new(MIN_ANSWERED_QUESTIONS)
    }
}

impl Gate for AnalystCheck {
    fn name(&self) -> &'static str {
        "analyst_check"
    }

    fn run(&self, ctx: &GateContext) -> GateResult {
        let path = ctx.report_dir("idea").join("idea.md");
        let Ok(text) = fs::read_to_string(&path) else {
            return GateResult::blocked(self.name(), format!("missing idea artifact at {}", path.display()));
        };
        let answered = count_answered_questions(&text);
        if answered < self.min_answered {
            return GateResult::blocked(
                self.name(),
                format!("idea intake has {answered} answered questions, needs at least {}", self.min_answered),
            );
        }
        GateResult::ok(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::AnalystCheck;
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
            stage: Stage::Research,
            branch: None,
            changed_files: Vec::new(),
        }
    }

    #[test]
    fn blocks_when_idea_artifact_is_missing() {
        let root = tempdir().expect("tempdir");
        let gate = AnalystCheck::default();
        let result = gate.run(&ctx(root.path()));
        assert_eq!(result.status, GateStatus::Blocked);
    }

    #[test]
    fn passes_with_enough_answered_questions() {
        let root = tempdir().expect("tempdir");
        let dir = root.path().join("reports/idea/AIDD-1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("idea.md"), "Q: why?\nA: because\n").expect("writes");

        let gate = AnalystCheck::default();
        let result = gate.run(&ctx(root.path()));
        assert_eq!(result.status, GateStatus::Ok);
    }
}
