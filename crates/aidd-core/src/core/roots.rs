// crates/aidd-core/src/core/roots.rs
// ============================================================================
// Module: Root Resolution
// Description: Locates the workspace root and the AIDD workflow root by
//   walking up from a starting directory.
// Purpose: Let the dispatcher and CLI find `reports/`, `config/`, and
//   `.aidd-plugin` consistently regardless of the caller's current directory.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Root discovery is a fixed, fail-closed search: it walks up from a starting
//! directory looking for one of a small set of marker files, and gives up
//! after a bounded number of steps rather than walking to the filesystem
//! root indefinitely.

use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

/// Marker files/directories that identify a workspace root, checked in
/// order.
const WORKSPACE_MARKERS: [&str; 3] = [".git", ".aidd-plugin", "pyproject.toml"];

/// Maximum number of parent directories walked before giving up.
const MAX_ANCESTOR_STEPS: usize = 64;

/// Resolved workspace and workflow roots for a dispatch invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRoots {
    /// The repository/workspace root (contains `.git` or an equivalent
    /// marker).
    pub workspace_root: PathBuf,
    /// The AIDD workflow root (`<workspace_root>/.aidd-plugin`, or the
    /// workspace root itself when no plugin directory exists yet).
    pub workflow_root: PathBuf,
}

/// Resolves workspace and workflow roots starting from `start`.
///
/// # Errors
///
/// Returns [`RootsError::NoMarkerFound`] when no marker file is found within
/// [`MAX_ANCESTOR_STEPS`] ancestors of `start`.
pub fn resolve_roots(start: &Path) -> Result<WorkflowRoots, RootsError> {
    let mut current = Some(start);
    let mut steps = 0usize;
    while let Some(dir) = current {
        if WORKSPACE_MARKERS.iter().any(|marker| dir.join(marker).exists()) {
            let plugin_dir = dir.join(".aidd-plugin");
            let workflow_root = if plugin_dir.is_dir() { plugin_dir } else { dir.to_path_buf() };
            return Ok(WorkflowRoots {
                workspace_root: dir.to_path_buf(),
                workflow_root,
            });
        }
        if steps >= MAX_ANCESTOR_STEPS {
            break;
        }
        steps += 1;
        current = dir.parent();
    }
    Err(RootsError::NoMarkerFound(start.to_path_buf()))
}

/// Failure resolving workspace/workflow roots.
#[derive(Debug, Error)]
pub enum RootsError {
    /// No marker file was found within the search bound.
    #[error("no workspace marker found above {0}")]
    NoMarkerFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::resolve_roots;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_git_marker_in_an_ancestor() {
        let root = tempdir().expect("tempdir");
        fs::create_dir(root.path().join(".git")).expect("mkdir");
        let nested = root.path().join("a/b/c");
        fs::create_dir_all(&nested).expect("mkdir");

        let roots = resolve_roots(&nested).expect("resolves");
        assert_eq!(roots.workspace_root, root.path());
        assert_eq!(roots.workflow_root, root.path());
    }

    #[test]
    fn prefers_aidd_plugin_directory_as_workflow_root() {
        let root = tempdir().expect("tempdir");
        fs::create_dir(root.path().join(".git")).expect("mkdir");
        fs::create_dir(root.path().join(".aidd-plugin")).expect("mkdir");

        let roots = resolve_roots(root.path()).expect("resolves");
        assert_eq!(roots.workflow_root, root.path().join(".aidd-plugin"));
    }

    #[test]
    fn fails_closed_when_no_marker_exists() {
        let root = tempdir().expect("tempdir");
        assert!(resolve_roots(root.path()).is_err());
    }
}
