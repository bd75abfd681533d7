// crates/aidd-core/src/core/stage_result.rs
// ============================================================================
// Module: Stage Result
// Description: The machine-readable result a stage entrypoint writes on
//   completion.
// Purpose: Give the dispatcher a typed, versioned artifact to parse instead
//   of scraping entrypoint stdout.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Stage entrypoints write one `stage_result.json` per invocation. The
//! `schema` field is a version tag the dispatcher checks before trusting the
//! rest of the document, so a future incompatible schema change fails
//! closed instead of being silently misparsed.

use serde::Deserialize;
use serde::Serialize;

use crate::core::ids::ScopeKey;
use crate::core::stage::Stage;
use crate::core::stage::StageResultStatus;
use crate::core::stage::Verdict;
use crate::core::time::Timestamp;

/// Schema tag expected in every stage result this dispatcher accepts.
pub const STAGE_RESULT_SCHEMA: &str = "aidd.stage_result.v1";

/// The machine-readable result of a single stage invocation.
///
/// # Invariants
/// - `schema` must equal [`STAGE_RESULT_SCHEMA`] for the dispatcher to trust
///   the record; callers should check this before consuming other fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    /// Schema version tag, expected to be [`STAGE_RESULT_SCHEMA`].
    pub schema: String,
    /// The stage that produced this result.
    pub stage: Stage,
    /// The scope key the result was produced under.
    pub scope_key: ScopeKey,
    /// Whether the stage finished, wants another pass, or is blocked.
    pub status: StageResultStatus,
    /// The review verdict, present only when `stage` is [`Stage::Review`].
    #[serde(default)]
    pub verdict: Option<Verdict>,
    /// A short machine-readable reason code, present on non-`done` results.
    pub reason_code: Option<String>,
    /// A human-readable summary for display/logging.
    pub summary: Option<String>,
    /// When the entrypoint produced this result.
    pub produced_at: Timestamp,
}

impl StageResult {
    /// Returns whether `schema` matches the schema this dispatcher accepts.
    #[must_use]
    pub fn has_known_schema(&self) -> bool {
        self.schema == STAGE_RESULT_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::STAGE_RESULT_SCHEMA;
    use super::StageResult;
    use crate::core::ids::ScopeKey;
    use crate::core::stage::Stage;
    use crate::core::stage::StageResultStatus;
    use crate::core::stage::Verdict;
    use crate::core::time::Timestamp;

    fn sample() -> StageResult {
        StageResult {
            schema: STAGE_RESULT_SCHEMA.to_string(),
            stage: Stage::Research,
            scope_key: ScopeKey::from("AIDD-1"),
            status: StageResultStatus::Done,
            verdict: None,
            reason_code: None,
            summary: Some("done".to_string()),
            produced_at: Timestamp::parse("2026-07-28T00:00:00Z").expect("valid"),
        }
    }

    #[test]
    fn carries_a_verdict_on_a_review_result() {
        let mut result = sample();
        result.stage = Stage::Review;
        result.verdict = Some(Verdict::Ship);
        let text = serde_json::to_string(&result).expect("serializes");
        let parsed: StageResult = serde_json::from_str(&text).expect("parses");
        assert_eq!(parsed.verdict, Some(Verdict::Ship));
    }

    #[test]
    fn round_trips_through_json() {
        let result = sample();
        let text = serde_json::to_string(&result).expect("serializes");
        let parsed: StageResult = serde_json::from_str(&text).expect("parses");
        assert_eq!(parsed, result);
    }

    #[test]
    fn rejects_unknown_schema() {
        let mut result = sample();
        result.schema = "aidd.stage_result.v2".to_string();
        assert!(!result.has_known_schema());
    }
}
