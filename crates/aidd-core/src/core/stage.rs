// crates/aidd-core/src/core/stage.rs
// ============================================================================
// Module: Stage Model
// Description: The closed set of pipeline stages and the small enums that
//   describe work-item normalization, loop verdicts, and stage result
//   status.
// Purpose: Give the dispatcher, gate engine, and loop runner a single shared
//   vocabulary for "where in the pipeline are we" and "what happened".
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The pipeline is a fixed, closed set of stages. Nothing in this crate
//! invents new stages at runtime; [`Stage::from_command`] only ever maps a
//! normalized command name onto one of the variants below. `review-plan`
//! and `review-prd` are internal stages (never dispatched directly from a
//! command name) used by the gate engine's own bookkeeping.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// One stage of the AIDD pipeline.
///
/// # Invariants
/// - The set of variants is closed; no stage is added or removed at runtime.
/// - Ordering follows the public pipeline order so that [`Stage::ALL`] can
///   be used to compute "next stage"; the two internal review stages sort
///   after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Initial idea capture.
    Idea,
    /// Research and evidence gathering.
    Research,
    /// Planning.
    Plan,
    /// Spec review preceding tasklist generation.
    ReviewSpec,
    /// Structured interview that resolves open spec questions.
    SpecInterview,
    /// Tasklist generation.
    Tasklist,
    /// Implementation.
    Implement,
    /// Implementation review.
    Review,
    /// Quality assurance.
    Qa,
    /// Reports the pipeline's current status; a loop-stage like command.
    Status,
    /// Internal: plan review bookkeeping.
    ReviewPlan,
    /// Internal: PRD review bookkeeping.
    ReviewPrd,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Self; 12] = [
        Self::Idea,
        Self::Research,
        Self::Plan,
        Self::ReviewSpec,
        Self::SpecInterview,
        Self::Tasklist,
        Self::Implement,
        Self::Review,
        Self::Qa,
        Self::Status,
        Self::ReviewPlan,
        Self::ReviewPrd,
    ];

    /// Returns the canonical kebab-case command name for this stage.
    #[must_use]
    pub const fn command_name(self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Research => "research",
            Self::Plan => "plan",
            Self::ReviewSpec => "review-spec",
            Self::SpecInterview => "spec-interview",
            Self::Tasklist => "tasklist",
            Self::Implement => "implement",
            Self::Review => "review",
            Self::Qa => "qa",
            Self::Status => "status",
            Self::ReviewPlan => "review-plan",
            Self::ReviewPrd => "review-prd",
        }
    }

    /// Parses a stage from its canonical command name.
    ///
    /// # Errors
    ///
    /// Returns [`StageParseError`] when `name` is not one of the canonical
    /// stage command names.
    pub fn from_command(name: &str) -> Result<Self, StageParseError> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.command_name() == name)
            .ok_or_else(|| StageParseError::Unknown(name.to_string()))
    }

    /// Returns the next stage in the pipeline, or `None` after `qa`.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        let index = Self::ALL.iter().position(|stage| *stage == self)?;
        Self::ALL.get(index + 1).copied()
    }

    /// Whether a work item entering this stage must carry an
    /// `iteration_id=…` key rather than a transitional `id=…` handoff key.
    fn requires_iteration_work_item(self) -> bool {
        matches!(self, Self::Implement | Self::Review)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_name())
    }
}

/// Failure parsing a stage name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StageParseError {
    /// The given name does not match any canonical stage.
    #[error("unknown stage: {0}")]
    Unknown(String),
}

/// Prefix marking a work-item key as the active loop iteration.
const ITERATION_PREFIX: &str = "iteration_id=";
/// Prefix marking a work-item key as a transitional handoff/review id.
const HANDOFF_PREFIX: &str = "id=";

/// Returns whether `value` is a well-formed work-item key: either
/// `iteration_id=<token>` or `id=<token>`.
#[must_use]
pub fn is_valid_work_item_key(value: &str) -> bool {
    work_item_token(value, ITERATION_PREFIX)
        .or_else(|| work_item_token(value, HANDOFF_PREFIX))
        .is_some_and(|token| !token.is_empty() && token.chars().all(is_work_item_token_char))
}

/// Returns whether `value` is specifically an `iteration_id=<token>` key.
#[must_use]
pub fn is_iteration_work_item_key(value: &str) -> bool {
    work_item_token(value, ITERATION_PREFIX).is_some_and(|token| !token.is_empty() && token.chars().all(is_work_item_token_char))
}

/// Strips `prefix` from `value`, if present.
fn work_item_token<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    value.strip_prefix(prefix)
}

/// Whether `ch` is allowed inside a work-item key token.
fn is_work_item_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | ':' | '-')
}

/// Normalizes a requested work item for entry into `stage`, returning the
/// work item to persist and the review/handoff report id to surface, if
/// any (§4.3). `stage` is `None` when no stage is known yet, and is treated
/// like a non-loop stage.
///
/// Four cases, in order:
/// - `requested` is empty or not a well-formed work-item key: clears both.
/// - `stage` is not `implement`/`review`: passes `requested` through
///   unchanged, with no report id.
/// - `requested` is already `iteration_id=…`: passes it through unchanged,
///   with no report id.
/// - `requested` is `id=<report-id>`: if `current` is a well-formed
///   `iteration_id=…`, keeps `current` as the work item and surfaces
///   `<report-id>`; otherwise clears the work item but still surfaces
///   `<report-id>`.
#[must_use]
pub fn normalize_work_item_for_stage(stage: Option<Stage>, requested: Option<&str>, current: Option<&str>) -> (Option<String>, Option<String>) {
    let requested = requested.unwrap_or("").trim();
    if requested.is_empty() || !is_valid_work_item_key(requested) {
        return (None, None);
    }

    if !stage.is_some_and(Stage::requires_iteration_work_item) {
        return (Some(requested.to_string()), None);
    }

    if is_iteration_work_item_key(requested) {
        return (Some(requested.to_string()), None);
    }

    let Some(report_id) = requested.strip_prefix(HANDOFF_PREFIX) else {
        return (None, None);
    };
    let report_id = report_id.trim();
    let report_id = (!report_id.is_empty()).then(|| report_id.to_string());

    let current = current.unwrap_or("").trim();
    if !current.is_empty() && is_iteration_work_item_key(current) {
        return (Some(current.to_string()), report_id);
    }
    (None, report_id)
}

/// Outcome of an implement→review loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The reviewed change is ready; the loop advances to the next work
    /// item or exits.
    Ship,
    /// The reviewed change needs another implement pass.
    Revise,
    /// The loop cannot proceed without human intervention.
    Blocked,
}

/// Status reported by a stage entrypoint in its machine-readable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageResultStatus {
    /// The stage completed successfully.
    Done,
    /// The stage made progress but has more work to do (e.g. a partial
    /// tasklist); the dispatcher re-invokes the same stage.
    Continue,
    /// The stage cannot proceed; the dispatcher surfaces this to the caller
    /// without advancing.
    Blocked,
}

#[cfg(test)]
mod tests {
    use super::Stage;
    use super::normalize_work_item_for_stage;

    #[test]
    fn round_trips_command_names() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_command(stage.command_name()), Ok(stage));
        }
    }

    #[test]
    fn rejects_unknown_command_name() {
        assert!(Stage::from_command("bogus-stage").is_err());
    }

    #[test]
    fn next_stage_chains_in_pipeline_order() {
        assert_eq!(Stage::Idea.next(), Some(Stage::Research));
        assert_eq!(Stage::ReviewPrd.next(), None);
    }

    #[test]
    fn empty_requested_work_item_clears_both_fields() {
        assert_eq!(normalize_work_item_for_stage(Some(Stage::Implement), None, Some("iteration_id=I7")), (None, None));
    }

    #[test]
    fn invalid_requested_work_item_clears_both_fields() {
        let result = normalize_work_item_for_stage(Some(Stage::Review), Some("not-a-key"), None);
        assert_eq!(result, (None, None));
    }

    #[test]
    fn non_loop_stage_passes_requested_work_item_through() {
        let result = normalize_work_item_for_stage(Some(Stage::Tasklist), Some("id=review:report-1"), None);
        assert_eq!(result, (Some("id=review:report-1".to_string()), None));
    }

    #[test]
    fn loop_stage_with_an_iteration_key_passes_through_with_no_report_id() {
        let result = normalize_work_item_for_stage(Some(Stage::Implement), Some("iteration_id=I7"), None);
        assert_eq!(result, (Some("iteration_id=I7".to_string()), None));
    }

    #[test]
    fn loop_stage_with_a_handoff_id_keeps_the_current_iteration_and_surfaces_the_report_id() {
        let result = normalize_work_item_for_stage(Some(Stage::Review), Some("id=review:report-42"), Some("iteration_id=I7"));
        assert_eq!(result, (Some("iteration_id=I7".to_string()), Some("review:report-42".to_string())));
    }

    #[test]
    fn loop_stage_with_a_handoff_id_and_no_current_iteration_clears_the_work_item() {
        let result = normalize_work_item_for_stage(Some(Stage::Implement), Some("id=review:report-42"), None);
        assert_eq!(result, (None, Some("review:report-42".to_string())));
    }
}
