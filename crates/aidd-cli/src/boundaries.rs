// crates/aidd-cli/src/boundaries.rs
// ============================================================================
// Module: Effective Boundary Loading
// Description: Loads a scope's readmap, writemap, and loop pack artifacts
//   and merges them into the hook policy's `EffectiveBoundaries`.
// Purpose: Give the `hook pre-tool-use` subcommand the merged view
//   `aidd-hooks::policy` expects, since no library crate owns this merge.
// Dependencies: aidd-core, aidd-hooks
// ============================================================================

//! ## Overview
//! `aidd-hooks::policy::EffectiveBoundaries` documents itself as "merged
//! from the readmap, writemap, and loop pack", but no function in that
//! crate performs the merge: `aidd-hooks::readmap` only loads each artifact
//! individually. This binary owns both the merge and the on-disk artifact
//! path convention, since the external interface contract does not name
//! one (unlike `active_state.json`/`stage_result.json`, which
//! `aidd-core`/`aidd-dispatch` already place). Artifacts are stored
//! alongside a scope's active state, under
//! `state/<scope_key>/{readmap.json,writemap.json,loop_pack.md}`, since
//! that directory already exists as the one per-scope state root.
//!
//! A missing artifact is not an error: most stages have no loop pack at
//! all, and a freshly-initialized scope may have no readmap/writemap yet.
//! A *malformed* artifact that exists but fails to parse is surfaced as an
//! error, matching this workspace's fail-closed config-loading convention.

use std::path::Path;
use std::path::PathBuf;

use aidd_core::ScopeKey;
use aidd_hooks::EffectiveBoundaries;
use aidd_hooks::MapLoadError;
use aidd_hooks::load_loop_pack_front_matter;
use aidd_hooks::load_readmap;
use aidd_hooks::load_writemap;

/// Returns the per-scope state directory artifacts are read from.
fn scope_state_dir(workflow_root: &Path, scope_key: &ScopeKey) -> PathBuf {
    workflow_root.join("state").join(scope_key.as_str())
}

/// Loads `loader(path)` when `path` exists, treating a missing file as
/// `Ok(None)` rather than an error.
fn load_if_present<T>(path: &Path, loader: impl FnOnce(&Path) -> Result<T, MapLoadError>) -> Result<Option<T>, MapLoadError> {
    if !path.is_file() {
        return Ok(None);
    }
    loader(path).map(Some)
}

/// Loads and merges the effective read/write boundaries for `scope_key`.
///
/// # Errors
///
/// Returns [`MapLoadError`] when a readmap, writemap, or loop pack exists on
/// disk but cannot be decoded or does not carry its expected schema tag.
pub fn load_effective_boundaries(workflow_root: &Path, scope_key: &ScopeKey) -> Result<EffectiveBoundaries, MapLoadError> {
    let state_dir = scope_state_dir(workflow_root, scope_key);
    let readmap = load_if_present(&state_dir.join("readmap.json"), load_readmap)?;
    let writemap = load_if_present(&state_dir.join("writemap.json"), load_writemap)?;
    let loop_pack = load_if_present(&state_dir.join("loop_pack.md"), load_loop_pack_front_matter)?;

    let mut read_allowed = readmap.as_ref().map(|map| map.allowed_paths.clone()).unwrap_or_default();
    let mut write_allowed = writemap.as_ref().map(|map| map.allowed_paths.clone()).unwrap_or_default();
    let mut write_blocks = writemap.as_ref().map(|map| map.write_blocks.clone()).unwrap_or_default();
    let docops_only = writemap.as_ref().map(|map| map.docops_only_paths.clone()).unwrap_or_default();

    if let Some(writemap) = &writemap {
        write_allowed.extend(writemap.always_allow.iter().cloned());
    }

    // A loop pack's own `allowed_paths`/`forbidden_paths` govern the active
    // work item specifically; its presence also unlocks each map's
    // loop-scoped allowances, per the readmap/writemap doc comments ("only
    // while a loop pack grants them for the current work item").
    if let Some(loop_pack) = &loop_pack {
        if let Some(readmap) = &readmap {
            read_allowed.extend(readmap.loop_allowed_paths.iter().cloned());
        }
        if let Some(writemap) = &writemap {
            write_allowed.extend(writemap.loop_allowed_paths.iter().cloned());
        }
        read_allowed.extend(loop_pack.boundaries.allowed_paths.iter().cloned());
        write_allowed.extend(loop_pack.boundaries.allowed_paths.iter().cloned());
        write_blocks.extend(loop_pack.boundaries.forbidden_paths.iter().cloned());
    }

    Ok(EffectiveBoundaries { read_allowed, write_allowed, docops_only, write_blocks })
}

#[cfg(test)]
mod tests {
    use super::load_effective_boundaries;
    use aidd_core::ScopeKey;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_artifacts_yield_empty_boundaries() {
        let root = tempdir().expect("tempdir");
        let scope_key = ScopeKey::new("AIDD-1");
        let boundaries = load_effective_boundaries(root.path(), &scope_key).expect("loads");
        assert!(boundaries.read_allowed.is_empty());
        assert!(boundaries.write_allowed.is_empty());
    }

    #[test]
    fn merges_readmap_writemap_and_loop_pack() {
        let root = tempdir().expect("tempdir");
        let scope_key = ScopeKey::new("AIDD-1");
        let state_dir = root.path().join("state").join(scope_key.as_str());
        fs::create_dir_all(&state_dir).expect("mkdir");
        fs::write(
            state_dir.join("readmap.json"),
            r#"{"schema":"aidd.readmap.v1","allowed_paths":["src/**"],"loop_allowed_paths":["fixtures/**"]}"#,
        )
        .expect("writes");
        fs::write(
            state_dir.join("writemap.json"),
            r#"{"schema":"aidd.writemap.v1","allowed_paths":["src/**"],"docops_only_paths":["docs/tasklist/**"],"write_blocks":["Cargo.lock"]}"#,
        )
        .expect("writes");
        fs::write(
            state_dir.join("loop_pack.md"),
            "---\nschema: aidd.loop_pack.v1\nwork_item_key: task-1\nboundaries:\n  allowed_paths:\n    - tests/**\n  forbidden_paths:\n    - config/**\n---\n",
        )
        .expect("writes");

        let boundaries = load_effective_boundaries(root.path(), &scope_key).expect("loads");
        assert!(boundaries.read_allowed.contains(&"src/**".to_string()));
        assert!(boundaries.read_allowed.contains(&"fixtures/**".to_string()));
        assert!(boundaries.read_allowed.contains(&"tests/**".to_string()));
        assert!(boundaries.write_allowed.contains(&"tests/**".to_string()));
        assert!(boundaries.write_blocks.contains(&"config/**".to_string()));
        assert!(boundaries.docops_only.contains(&"docs/tasklist/**".to_string()));
    }

    #[test]
    fn malformed_readmap_is_an_error() {
        let root = tempdir().expect("tempdir");
        let scope_key = ScopeKey::new("AIDD-1");
        let state_dir = root.path().join("state").join(scope_key.as_str());
        fs::create_dir_all(&state_dir).expect("mkdir");
        fs::write(state_dir.join("readmap.json"), "not json").expect("writes");

        assert!(load_effective_boundaries(root.path(), &scope_key).is_err());
    }
}
