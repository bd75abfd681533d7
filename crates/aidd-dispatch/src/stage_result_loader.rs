// crates/aidd-dispatch/src/stage_result_loader.rs
// ============================================================================
// Module: Stage Result Loader
// Description: Loads the machine-readable result an entrypoint wrote after
//   it exits.
// Purpose: Give the dispatcher one place that knows both the expected exact
//   path and the fallback search used when an entrypoint wrote its result
//   under a scope key the dispatcher did not expect.
// Dependencies: aidd-core
// ============================================================================

//! ## Overview
//! Every entrypoint is expected to write `stage_result.json` under
//! `reports/<stage>/<scope_key>/`. When that exact file is missing,
//! [`load_stage_result`] falls back to a bounded glob over every scope key
//! reported for the same stage, accepting only a result written within
//! [`FALLBACK_WINDOW`] of dispatch start. A result recovered this way is
//! reported with [`StageResultLoad::scope_mismatch`] set so the caller can
//! warn that the entrypoint wrote under the wrong scope key.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;

use aidd_core::ScopeKey;
use aidd_core::Stage;
use aidd_core::StageResult;

use crate::error::DispatchError;

/// Maximum age, relative to dispatch start, a fallback-discovered stage
/// result may have before it is rejected as stale.
const FALLBACK_WINDOW: Duration = Duration::from_secs(120);

/// A stage result recovered from disk, annotated with whether it was found
/// at its expected path or via the scope-mismatch fallback search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResultLoad {
    /// The decoded stage result.
    pub result: StageResult,
    /// Set when the result was recovered from a scope key other than the
    /// one the dispatcher expected.
    pub scope_mismatch: Option<ScopeKey>,
}

/// Returns the expected path for a stage result.
#[must_use]
pub fn stage_result_path(workspace_root: &Path, stage: Stage, scope_key: &ScopeKey) -> PathBuf {
    workspace_root
        .join("reports")
        .join(stage.command_name())
        .join(scope_key.as_str())
        .join("stage_result.json")
}

/// Loads the stage result for `stage`/`scope_key` under `workspace_root`.
///
/// Tries the exact expected path first. If it is missing, searches every
/// other scope directory reported for `stage` and accepts the first
/// `stage_result.json` modified no earlier than `dispatch_started_at -
/// FALLBACK_WINDOW`, reporting the mismatch via
/// [`StageResultLoad::scope_mismatch`].
///
/// # Errors
///
/// Returns [`DispatchError::MissingStageResult`] when neither the exact
/// path nor the fallback search finds a result, and
/// [`DispatchError::MalformedStageResult`] when a found file cannot be
/// decoded or carries an unrecognized schema.
pub fn load_stage_result(
    workspace_root: &Path,
    stage: Stage,
    scope_key: &ScopeKey,
    dispatch_started_at: SystemTime,
) -> Result<StageResultLoad, DispatchError> {
    let exact_path = stage_result_path(workspace_root, stage, scope_key);
    if exact_path.is_file() {
        let result = decode_stage_result(&exact_path)?;
        return Ok(StageResultLoad {
            result,
            scope_mismatch: None,
        });
    }

    let stage_dir = workspace_root.join("reports").join(stage.command_name());
    let Ok(entries) = fs::read_dir(&stage_dir) else {
        return Err(DispatchError::MissingStageResult(exact_path));
    };

    for entry in entries.filter_map(Result::ok) {
        let candidate_scope = entry.file_name();
        if candidate_scope.to_string_lossy() == scope_key.as_str() {
            continue;
        }
        let candidate_path = entry.path().join("stage_result.json");
        if !candidate_path.is_file() {
            continue;
        }
        let Ok(metadata) = fs::metadata(&candidate_path) else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if !is_within_fallback_window(modified, dispatch_started_at) {
            continue;
        }
        let result = decode_stage_result(&candidate_path)?;
        return Ok(StageResultLoad {
            result,
            scope_mismatch: Some(ScopeKey::from(candidate_scope.to_string_lossy().into_owned())),
        });
    }

    Err(DispatchError::MissingStageResult(exact_path))
}

/// Returns whether `modified` falls within [`FALLBACK_WINDOW`] of
/// `dispatch_started_at`, tolerating clock skew in either direction.
fn is_within_fallback_window(modified: SystemTime, dispatch_started_at: SystemTime) -> bool {
    let delta = modified
        .duration_since(dispatch_started_at)
        .or_else(|_| dispatch_started_at.duration_since(modified));
    delta.is_ok_and(|delta| delta <= FALLBACK_WINDOW)
}

/// Reads and decodes the stage result at `path`, rejecting an unrecognized
/// schema.
fn decode_stage_result(path: &Path) -> Result<StageResult, DispatchError> {
    let bytes = fs::read(path).map_err(|_| DispatchError::MissingStageResult(path.to_path_buf()))?;
    let result: StageResult =
        serde_json::from_slice(&bytes).map_err(|_| DispatchError::MalformedStageResult(path.to_path_buf()))?;
    if !result.has_known_schema() {
        return Err(DispatchError::MalformedStageResult(path.to_path_buf()));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::load_stage_result;
    use super::stage_result_path;
    use aidd_core::STAGE_RESULT_SCHEMA;
    use aidd_core::ScopeKey;
    use aidd_core::Stage;
    use aidd_core::StageResult;
    use aidd_core::StageResultStatus;
    use aidd_core::Timestamp;
    use std::fs;
    use std::time::SystemTime;
    use tempfile::tempdir;

    fn sample(scope_key: &ScopeKey) -> StageResult {
        StageResult {
            schema: STAGE_RESULT_SCHEMA.to_string(),
            stage: Stage::Research,
            scope_key: scope_key.clone(),
            status: StageResultStatus::Done,
            verdict: None,
            reason_code: None,
            summary: Some("ok".to_string()),
            produced_at: Timestamp::parse("2026-07-28T00:00:00Z").expect("valid"),
        }
    }

    #[test]
    fn loads_the_exact_path_when_present() {
        let root = tempdir().expect("tempdir");
        let scope_key = ScopeKey::from("AIDD-1");
        let path = stage_result_path(root.path(), Stage::Research, &scope_key);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, serde_json::to_vec(&sample(&scope_key)).expect("encodes")).expect("writes");

        let loaded = load_stage_result(root.path(), Stage::Research, &scope_key, SystemTime::now()).expect("loads");
        assert_eq!(loaded.scope_mismatch, None);
        assert_eq!(loaded.result.scope_key, scope_key);
    }

    #[test]
    fn falls_back_to_a_recent_result_under_another_scope_key() {
        let root = tempdir().expect("tempdir");
        let expected_scope = ScopeKey::from("AIDD-1");
        let actual_scope = ScopeKey::from("AIDD-1-typo");
        let path = stage_result_path(root.path(), Stage::Research, &actual_scope);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, serde_json::to_vec(&sample(&actual_scope)).expect("encodes")).expect("writes");

        let loaded =
            load_stage_result(root.path(), Stage::Research, &expected_scope, SystemTime::now()).expect("loads");
        assert_eq!(loaded.scope_mismatch, Some(actual_scope));
    }

    #[test]
    fn errors_when_nothing_is_found() {
        let root = tempdir().expect("tempdir");
        let scope_key = ScopeKey::from("AIDD-1");
        let result = load_stage_result(root.path(), Stage::Research, &scope_key, SystemTime::now());
        assert!(result.is_err());
    }
}
