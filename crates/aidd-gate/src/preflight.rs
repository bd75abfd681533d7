// crates/aidd-gate/src/preflight.rs
// ============================================================================
// Module: Preflight Composition
// Description: Maps each stage to its ordered list of preflight gates and
//   runs them with short-circuit semantics.
// Purpose: Give the dispatcher one call that returns either a clean pass or
//   the first blocking gate result.
// Dependencies: aidd-core, aidd-gate::gate, aidd-gate::gates
// ============================================================================

//! ## Overview
//! Each stage names an ordered sequence of preflight gates (the table in
//! the external interface contract), and [`run_stage_preflight`] walks an
//! ordered `Vec<Box<dyn Gate>>` with short-circuit semantics: the first
//! blocking gate stops the sequence, so later gates in the same preflight
//! never run.

use aidd_core::GateResult;
use aidd_core::Stage;

use crate::context::GateContext;
use crate::gate::Gate;
use crate::gates::AnalystCheck;
use crate::gates::DiffBoundaryCheck;
use crate::gates::PlanReviewGate;
use crate::gates::PrdReviewGate;
use crate::gates::QaGate;
use crate::gates::ResearchCheck;
use crate::gates::TasklistCheck;

/// Returns the ordered preflight gates that guard `stage`, given the
/// configured thresholds.
///
/// Sequences follow the table in the external interface contract (§4.4):
/// each stage's gates are a prefix-extension of the previous stage's, so a
/// ticket that would block an earlier stage also blocks every later one
/// that re-checks the same artifact.
#[must_use]
pub fn gates_for_stage(
    stage: Stage,
    min_question_count: u32,
    research_freshness_days: u32,
    allowed_diff_globs: Vec<String>,
) -> Vec<Box<dyn Gate>> {
    let analyst = || Box::new(AnalystCheck::new(min_question_count)) as Box<dyn Gate>;
    let plan_review = || Box::new(PlanReviewGate) as Box<dyn Gate>;
    let prd_review = || Box::new(PrdReviewGate) as Box<dyn Gate>;
    let research = || Box::new(ResearchCheck::new(research_freshness_days)) as Box<dyn Gate>;
    let tasklist = || Box::new(TasklistCheck) as Box<dyn Gate>;
    let diff_boundary = || Box::new(DiffBoundaryCheck::new(allowed_diff_globs.clone())) as Box<dyn Gate>;

    match stage {
        Stage::Idea | Stage::Research => vec![analyst()],
        Stage::Plan => vec![analyst(), plan_review()],
        Stage::ReviewSpec => vec![analyst(), plan_review(), prd_review()],
        Stage::Tasklist => vec![analyst(), plan_review(), prd_review(), research(), tasklist()],
        Stage::Implement | Stage::Review => vec![
            analyst(),
            plan_review(),
            prd_review(),
            research(),
            tasklist(),
            diff_boundary(),
        ],
        Stage::Qa => vec![analyst(), plan_review(), prd_review(), research(), tasklist()],
    }
}

/// Runs every gate guarding `ctx.stage` in order, stopping at the first
/// blocking result.
///
/// Returns the full list of results evaluated so far; the caller should
/// treat the sequence as blocked overall when the last entry's status is
/// blocking (`GateResult::is_blocking`).
#[must_use]
pub fn run_stage_preflight(ctx: &GateContext, gates: &[Box<dyn Gate>]) -> Vec<GateResult> {
    let mut results = Vec::with_capacity(gates.len());
    for gate in gates {
        let result = gate.run(ctx);
        let blocked = result.is_blocking();
        results.push(result);
        if blocked {
            break;
        }
    }
    results
}
