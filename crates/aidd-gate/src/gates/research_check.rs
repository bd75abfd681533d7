// crates/aidd-gate/src/gates/research_check.rs
// ============================================================================
// Module: Research Check Gate
// Description: Verifies research evidence exists and is not stale before
//   planning starts.
// Purpose: Guard the `plan` stage's preflight.
// Dependencies: aidd-core, aidd-gate::markdown, time
// ============================================================================

use std::fs;

use aidd_core::GateResult;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::context::GateContext;
use crate::gate::Gate;
use crate::markdown::extract_front_matter;

/// Verifies `reports/research/<scope>/research.md` exists and its
/// `updated_at` front-matter field is within a freshness window.
pub struct ResearchCheck {
    /// Maximum age, in days, research evidence may be before this gate
    /// blocks.
    freshness_days: u32,
}

impl ResearchCheck {
    /// Builds the gate with the given freshness window, in days.
    #[must_use]
    pub const fn new(freshness_days: u32) -> Self {
        Self { freshness_days }
    }
}

impl Gate for ResearchCheck {
    fn name(&self) -> &'static str {
        "research_check"
    }

    fn run(&self, ctx: &GateContext) -> GateResult {
        let path = ctx.report_dir("research").join("research.md");
        let Ok(text) = fs::read_to_string(&path) else {
            return GateResult::blocked(self.name(), format!("missing research artifact at {}", path.display()));
        };

        let fields = extract_front_matter(&text);
        let Some(updated_at) = fields.get("updated_at") else {
            return GateResult::blocked(self.name(), "research artifact is missing an updated_at field".to_string());
        };
        let Ok(updated_at) = OffsetDateTime::parse(updated_at, &Rfc3339) else {
            return GateResult::blocked(self.name(), format!("research artifact updated_at {updated_at:?} is not valid RFC 3339"));
        };

        let age_days = (OffsetDateTime::now_utc() - updated_at).whole_days();
        if age_days > i64::from(self.freshness_days) {
            return GateResult::blocked(
                self.name(),
                format!("research evidence is {age_days} days old, exceeds the {}-day freshness window", self.freshness_days),
            );
        }
        GateResult::ok(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::ResearchCheck;
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
            stage: Stage::Plan,
            branch: None,
            changed_files: Vec::new(),
        }
    }

    #[test]
    fn blocks_without_an_updated_at_field() {
        let root = tempdir().expect("tempdir");
        let dir = root.path().join("reports/research/AIDD-1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("research.md"), "no front matter here").expect("writes");

        let gate = ResearchCheck::new(14);
        let result = gate.run(&ctx(root.path()));
        assert_eq!(result.status, GateStatus::Blocked);
    }

    #[test]
    fn blocks_when_evidence_is_stale() {
        let root = tempdir().expect("tempdir");
        let dir = root.path().join("reports/research/AIDD-1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("research.md"), "---\nupdated_at: 2000-01-01T00:00:00Z\n---\nbody").expect("writes");

        let gate = ResearchCheck::new(14);
        let result = gate.run(&ctx(root.path()));
        assert_eq!(result.status, GateStatus::Blocked);
    }
}
