// crates/aidd-gate/src/gates/plan_review_gate.rs
// ============================================================================
// Module: Plan Review Gate
// Description: Verifies the plan artifact exists and has an approach
//   section before spec review starts.
// Purpose: Guard the `review-spec` stage's preflight.
// Dependencies: aidd-core, aidd-gate::markdown
// ============================================================================

use std::fs;

use aidd_core::GateResult;

use crate::context::GateContext;
use crate::gate::Gate;
use crate::markdown::has_heading;

/// Heading the plan artifact must contain.
const REQUIRED_HEADING: &str = "Approach";

/// Verifies `reports/plan/<scope>/plan.md` exists and documents an
/// approach.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanReviewGate;

impl Gate for PlanReviewGate {
    fn name(&self) -> &'static str {
        "plan_review_gate"
    }

    fn run(&self, ctx: &GateContext) -> GateResult {
        let path = ctx.report_dir("plan").join("plan.md");
        let Ok(text) = fs::read_to_string(&path) else {
            return GateResult::blocked(self.name(), format!("missing plan artifact at {}", path.display()));
        };
        if !has_heading(&text, REQUIRED_HEADING) {
            return GateResult::blocked(self.name(), format!("plan artifact is missing a {REQUIRED_HEADING:?} section"));
        }
        GateResult::ok(self.name())
    }
}
