// crates/aidd-hooks/src/stamp.rs
// ============================================================================
// Module: Rate-Limited Warning Stamps
// Description: Epoch-seconds stamp files that rate-limit repeated hook
//   warnings per guard.
// Purpose: Stop the hook policy from re-emitting the same context-budget or
//   dependency-segment warning on every single tool call.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A stamp is a single epoch-seconds integer written to
//! `<log_dir>/.context-gc-<guard>.stamp`. A stale or unparsable stamp is
//! treated as "no stamp", so the guard fails open in favor of emitting its
//! warning once rather than staying silent forever on a corrupted file.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Returns the stamp file path for `guard` under `log_dir`.
#[must_use]
pub fn stamp_path(log_dir: &Path, guard: &str) -> PathBuf {
    log_dir.join(format!(".context-gc-{guard}.stamp"))
}

/// Returns whether a guard's warning should fire `now` (given as epoch
/// seconds), given the stamp recorded at `path` and a minimum interval.
///
/// Does not write the stamp; callers that decide to emit the warning must
/// call [`write_stamp`] afterward.
#[must_use]
pub fn should_emit(path: &Path, min_interval_secs: u64, now: u64) -> bool {
    let Ok(text) = fs::read_to_string(path) else {
        return true;
    };
    let Ok(last) = text.trim().parse::<u64>() else {
        return true;
    };
    now.saturating_sub(last) >= min_interval_secs
}

/// Writes `now` (epoch seconds) to the stamp file at `path`, creating its
/// parent directory if needed.
///
/// # Errors
///
/// Returns an error when the parent directory cannot be created or the
/// stamp file cannot be written.
pub fn write_stamp(path: &Path, now: u64) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, now.to_string())
}

#[cfg(test)]
mod tests {
    use super::should_emit;
    use super::stamp_path;
    use super::write_stamp;
    use tempfile::tempdir;

    #[test]
    fn emits_when_no_stamp_exists() {
        let dir = tempdir().expect("tempdir");
        let path = stamp_path(dir.path(), "context-budget");
        assert!(should_emit(&path, 60, 1_000));
    }

    #[test]
    fn does_not_emit_within_the_interval() {
        let dir = tempdir().expect("tempdir");
        let path = stamp_path(dir.path(), "context-budget");
        write_stamp(&path, 1_000).expect("writes");
        assert!(!should_emit(&path, 60, 1_010));
    }

    #[test]
    fn emits_again_after_the_interval_elapses() {
        let dir = tempdir().expect("tempdir");
        let path = stamp_path(dir.path(), "context-budget");
        write_stamp(&path, 1_000).expect("writes");
        assert!(should_emit(&path, 60, 1_100));
    }

    #[test]
    fn treats_an_unparsable_stamp_as_no_stamp() {
        let dir = tempdir().expect("tempdir");
        let path = stamp_path(dir.path(), "context-budget");
        std::fs::write(&path, "not-a-number").expect("writes");
        assert!(should_emit(&path, 60, 1_000));
    }
}
