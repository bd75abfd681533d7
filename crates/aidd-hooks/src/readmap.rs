// crates/aidd-hooks/src/readmap.rs
// ============================================================================
// Module: Readmap/Writemap/Loop Pack Loading
// Description: Loads the JSON readmap/writemap artifacts and the YAML
//   front-matter boundaries of a loop pack.
// Purpose: Give the hook policy a typed view of "which paths is this tool
//   call allowed to touch" without re-parsing JSON/YAML at every decision.
// Dependencies: aidd-core, serde, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! `aidd.readmap.v1` and `aidd.writemap.v1` are plain JSON documents; a loop
//! pack is a markdown file whose `---`-fenced header is YAML carrying
//! `schema: aidd.loop_pack.v1` and a `boundaries` object. All three loaders
//! are read-only and never mutate the files they load.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Schema tag expected in a readmap document.
pub const READMAP_SCHEMA: &str = "aidd.readmap.v1";
/// Schema tag expected in a writemap document.
pub const WRITEMAP_SCHEMA: &str = "aidd.writemap.v1";
/// Schema tag expected in a loop pack's front matter.
pub const LOOP_PACK_SCHEMA: &str = "aidd.loop_pack.v1";

/// One entry in a readmap or writemap, naming a glob and why it is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    /// The path glob this entry covers.
    pub path: String,
    /// A short human-readable reason the path is allowed.
    #[serde(default)]
    pub reason: String,
}

/// `aidd.readmap.v1`: the set of paths a loop-stage session may read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readmap {
    /// Schema version tag, expected to equal [`READMAP_SCHEMA`].
    pub schema: String,
    /// The individual entries this readmap was built from.
    #[serde(default)]
    pub entries: Vec<MapEntry>,
    /// Path globs allowed for reads regardless of loop pack boundaries.
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    /// Path globs allowed only while a loop pack grants them for the
    /// current work item.
    #[serde(default)]
    pub loop_allowed_paths: Vec<String>,
}

impl Readmap {
    /// Returns whether this readmap carries the schema tag the hook policy
    /// trusts.
    #[must_use]
    pub fn has_known_schema(&self) -> bool {
        self.schema == READMAP_SCHEMA
    }
}

/// `aidd.writemap.v1`: the set of paths a loop-stage session may write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Writemap {
    /// Schema version tag, expected to equal [`WRITEMAP_SCHEMA`].
    pub schema: String,
    /// The individual entries this writemap was built from.
    #[serde(default)]
    pub entries: Vec<MapEntry>,
    /// Path globs allowed for writes regardless of loop pack boundaries.
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    /// Path globs allowed only while a loop pack grants them for the
    /// current work item.
    #[serde(default)]
    pub loop_allowed_paths: Vec<String>,
    /// Path globs that must be edited through the DocOps/actions pathway,
    /// never through a direct tool write, even inside `allowed_paths`.
    #[serde(default)]
    pub docops_only_paths: Vec<String>,
    /// Path globs every writemap implicitly allows, matching the gate
    /// engine's own `reports/**` allowances.
    #[serde(default)]
    pub always_allow: Vec<String>,
    /// Path globs always rejected, taking precedence over `allowed_paths`.
    #[serde(default)]
    pub write_blocks: Vec<String>,
}

impl Writemap {
    /// Returns whether this writemap carries the schema tag the hook policy
    /// trusts.
    #[must_use]
    pub fn has_known_schema(&self) -> bool {
        self.schema == WRITEMAP_SCHEMA
    }
}

/// The boundary section of a loop pack's front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPackBoundaries {
    /// Path globs this work item is allowed to touch.
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    /// Path globs this work item must not touch even if `allowed_paths`
    /// would otherwise permit them.
    #[serde(default)]
    pub forbidden_paths: Vec<String>,
}

/// The subset of a loop pack's YAML front matter the hook policy and
/// diff-boundary gate need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPackFrontMatter {
    /// Schema version tag, expected to equal [`LOOP_PACK_SCHEMA`].
    pub schema: String,
    /// The work item this pack was generated for.
    pub work_item_key: String,
    /// The path boundaries this pack grants.
    #[serde(default)]
    pub boundaries: LoopPackBoundaries,
}

/// Failure loading a readmap, writemap, or loop pack.
#[derive(Debug, Error)]
pub enum MapLoadError {
    /// An I/O operation against `path` failed.
    #[error("I/O error reading {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
    /// The file at `path` could not be decoded.
    #[error("could not decode {0}: {1}")]
    Decode(PathBuf, String),
    /// The document at `path` did not carry the expected schema tag.
    #[error("{0} does not carry the expected schema tag")]
    UnknownSchema(PathBuf),
}

/// Loads a readmap JSON document from `path`.
///
/// # Errors
///
/// Returns [`MapLoadError`] when the file cannot be read, decoded, or does
/// not carry [`READMAP_SCHEMA`].
pub fn load_readmap(path: &Path) -> Result<Readmap, MapLoadError> {
    let bytes = fs::read(path).map_err(|err| MapLoadError::Io(path.to_path_buf(), err))?;
    let readmap: Readmap =
        serde_json::from_slice(&bytes).map_err(|err| MapLoadError::Decode(path.to_path_buf(), err.to_string()))?;
    if !readmap.has_known_schema() {
        return Err(MapLoadError::UnknownSchema(path.to_path_buf()));
    }
    Ok(readmap)
}

/// Loads a writemap JSON document from `path`.
///
/// # Errors
///
/// Returns [`MapLoadError`] when the file cannot be read, decoded, or does
/// not carry [`WRITEMAP_SCHEMA`].
pub fn load_writemap(path: &Path) -> Result<Writemap, MapLoadError> {
    let bytes = fs::read(path).map_err(|err| MapLoadError::Io(path.to_path_buf(), err))?;
    let writemap: Writemap =
        serde_json::from_slice(&bytes).map_err(|err| MapLoadError::Decode(path.to_path_buf(), err.to_string()))?;
    if !writemap.has_known_schema() {
        return Err(MapLoadError::UnknownSchema(path.to_path_buf()));
    }
    Ok(writemap)
}

/// Loads a loop pack's YAML front matter from the markdown file at `path`.
///
/// # Errors
///
/// Returns [`MapLoadError`] when the file cannot be read, does not open
/// with a `---` front-matter fence, the fenced block cannot be decoded as
/// YAML, or the decoded document does not carry [`LOOP_PACK_SCHEMA`].
pub fn load_loop_pack_front_matter(path: &Path) -> Result<LoopPackFrontMatter, MapLoadError> {
    let text = fs::read_to_string(path).map_err(|err| MapLoadError::Io(path.to_path_buf(), err))?;
    let front_matter =
        extract_yaml_front_matter(&text).ok_or_else(|| MapLoadError::Decode(path.to_path_buf(), "missing front matter fence".to_string()))?;
    let parsed: LoopPackFrontMatter =
        serde_yaml::from_str(front_matter).map_err(|err| MapLoadError::Decode(path.to_path_buf(), err.to_string()))?;
    if parsed.schema != LOOP_PACK_SCHEMA {
        return Err(MapLoadError::UnknownSchema(path.to_path_buf()));
    }
    Ok(parsed)
}

/// Returns the text between the opening and closing `---` fences at the
/// start of `text`, or `None` when `text` does not open with a fence.
fn extract_yaml_front_matter(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let end = rest.find("\n---")?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::load_loop_pack_front_matter;
    use super::load_readmap;
    use super::load_writemap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_a_well_formed_readmap() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scope.readmap.json");
        fs::write(
            &path,
            r#"{"schema":"aidd.readmap.v1","entries":[],"allowed_paths":["src/**"],"loop_allowed_paths":[]}"#,
        )
        .expect("writes");
        let readmap = load_readmap(&path).expect("loads");
        assert_eq!(readmap.allowed_paths, vec!["src/**".to_string()]);
    }

    #[test]
    fn rejects_a_readmap_with_the_wrong_schema() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scope.readmap.json");
        fs::write(&path, r#"{"schema":"aidd.readmap.v2","entries":[]}"#).expect("writes");
        assert!(load_readmap(&path).is_err());
    }

    #[test]
    fn loads_a_well_formed_writemap() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scope.writemap.json");
        fs::write(
            &path,
            r#"{"schema":"aidd.writemap.v1","docops_only_paths":["docs/tasklist/**"]}"#,
        )
        .expect("writes");
        let writemap = load_writemap(&path).expect("loads");
        assert_eq!(writemap.docops_only_paths, vec!["docs/tasklist/**".to_string()]);
    }

    #[test]
    fn loads_loop_pack_front_matter_from_markdown() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scope.loop.pack.md");
        fs::write(
            &path,
            "---\nschema: aidd.loop_pack.v1\nwork_item_key: iteration_id=I3\nboundaries:\n  allowed_paths:\n    - src/**\n  forbidden_paths:\n    - docs/**\n---\n# Loop Pack\n",
        )
        .expect("writes");
        let front_matter = load_loop_pack_front_matter(&path).expect("loads");
        assert_eq!(front_matter.work_item_key, "iteration_id=I3");
        assert_eq!(front_matter.boundaries.allowed_paths, vec!["src/**".to_string()]);
        assert_eq!(front_matter.boundaries.forbidden_paths, vec!["docs/**".to_string()]);
    }

    #[test]
    fn rejects_markdown_without_a_front_matter_fence() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scope.loop.pack.md");
        fs::write(&path, "# No front matter\n").expect("writes");
        assert!(load_loop_pack_front_matter(&path).is_err());
    }
}
