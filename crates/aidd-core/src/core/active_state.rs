// crates/aidd-core/src/core/active_state.rs
// ============================================================================
// Module: Active State
// Description: The active-workflow-state entity, its file-backed store, and
//   the merge-write / identifier-scaffolding operations built on top of it.
// Purpose: Give the dispatcher a single, atomically-updated record of which
//   ticket/stage/work-item a workflow is currently on.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `docs/.active.json` is the one piece of mutable state the dispatcher
//! owns, and there is exactly one document per workflow root (not one per
//! scope key). Writes go through [`FileActiveStateStore::save`], which
//! writes to a sibling temp file and renames it into place so a reader
//! never observes a partially written file. [`write_active_state`] and
//! [`write_identifiers`] are the merge-aware operations every caller above
//! this module should use instead of reading and re-saving a whole
//! [`ActiveState`] by hand.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::ids::SlugHint;
use crate::core::ids::Ticket;
use crate::core::stage::Stage;
use crate::core::stage::StageParseError;
use crate::core::stage::normalize_work_item_for_stage;
use crate::core::time::Timestamp;
use crate::interfaces::ActiveStateStore;

/// The relative path of the single active-state document under a workflow
/// root.
const ACTIVE_STATE_RELATIVE_PATH: [&str; 2] = ["docs", ".active.json"];
/// The relative path of the PRD template scaffolded documents are copied
/// from.
const PRD_TEMPLATE_RELATIVE_PATH: [&str; 3] = ["docs", "prd", "template.md"];
/// The relative directory a ticket's PRD document is scaffolded into.
const PRD_RELATIVE_DIR: [&str; 2] = ["docs", "prd"];

/// The active-workflow-state record for a workflow root.
///
/// # Invariants
/// - Every field is optional: a freshly initialized workflow root has no
///   document at all, and [`write_active_state`]'s merge semantics (`None`
///   keeps the prior value, `Some("")` clears it) can leave any individual
///   field unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveState {
    /// The ticket this state belongs to.
    pub ticket: Option<Ticket>,
    /// The slug hint recorded alongside the ticket.
    pub slug_hint: Option<SlugHint>,
    /// The stage the workflow is currently on.
    pub stage: Option<Stage>,
    /// The work item currently in flight, if any, as its raw key (e.g.
    /// `iteration_id=I7`).
    pub work_item: Option<String>,
    /// The most recent `id=review:…`/`id=qa:…` report id surfaced by
    /// [`normalize_work_item_for_stage`], retained even after the work
    /// item itself reverts to an iteration key.
    pub last_review_report_id: Option<String>,
    /// When this record was last written.
    pub updated_at: Option<Timestamp>,
}

/// Returns the path to the single active-state document under
/// `workflow_root`.
#[must_use]
pub fn active_state_path(workflow_root: &Path) -> PathBuf {
    ACTIVE_STATE_RELATIVE_PATH.iter().fold(workflow_root.to_path_buf(), |path, segment| path.join(segment))
}

/// File-backed [`ActiveStateStore`] rooted at a workflow directory.
pub struct FileActiveStateStore {
    /// The workflow root under which `docs/.active.json` is read and
    /// written.
    workflow_root: PathBuf,
}

impl FileActiveStateStore {
    /// Builds a store rooted at `workflow_root`.
    #[must_use]
    pub fn new(workflow_root: PathBuf) -> Self {
        Self { workflow_root }
    }
}

impl ActiveStateStore for FileActiveStateStore {
    fn load(&self) -> Result<Option<ActiveState>, ActiveStateError> {
        let path = active_state_path(&self.workflow_root);
        match fs::read(&path) {
            Ok(bytes) => {
                let state = serde_json::from_slice(&bytes)
                    .map_err(|err| ActiveStateError::Decode(path.clone(), err))?;
                Ok(Some(state))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ActiveStateError::Io(path, err)),
        }
    }

    fn save(&self, state: &ActiveState) -> Result<(), ActiveStateError> {
        let path = active_state_path(&self.workflow_root);
        let Some(parent) = path.parent() else {
            return Err(ActiveStateError::InvalidPath(path));
        };
        fs::create_dir_all(parent).map_err(|err| ActiveStateError::Io(parent.to_path_buf(), err))?;

        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|err| ActiveStateError::Encode(path.clone(), err))?;

        let temp_path = parent.join(".active.json.tmp");
        fs::write(&temp_path, &bytes).map_err(|err| ActiveStateError::Io(temp_path.clone(), err))?;
        fs::rename(&temp_path, &path).map_err(|err| ActiveStateError::Io(path, err))?;
        Ok(())
    }
}

/// Merge-writes `store`'s active state (§4.3): `None` keeps the prior
/// value for that field, `Some("")` clears it, and any other `Some(value)`
/// sets it. `work_item` is additionally run through
/// [`normalize_work_item_for_stage`] for `stage` (the stage supplied here,
/// or the prior stage if `stage` is `None`), which may surface a new
/// `last_review_report_id`.
///
/// # Errors
///
/// Returns [`ActiveStateError`] when the prior state cannot be read or the
/// merged state cannot be written.
pub fn write_active_state(
    store: &dyn ActiveStateStore,
    ticket: Option<&str>,
    slug_hint: Option<&str>,
    stage: Option<Stage>,
    work_item: Option<&str>,
    now: Timestamp,
) -> Result<ActiveState, ActiveStateError> {
    let current = store.load()?.unwrap_or_default();

    let ticket_value = merged_field(ticket, current.ticket.as_ref().map(Ticket::as_str)).map(Ticket::from);
    let slug_value = merged_field(slug_hint, current.slug_hint.as_ref().map(SlugHint::as_str)).map(SlugHint::from);
    let stage_value = stage.or(current.stage);

    let requested_work_item = match work_item {
        Some(value) => value.trim(),
        None => current.work_item.as_deref().unwrap_or("").trim(),
    };
    let (work_item_value, report_id) =
        normalize_work_item_for_stage(stage_value, Some(requested_work_item), current.work_item.as_deref());

    let last_review_report_id = report_id.or(current.last_review_report_id);

    let state = ActiveState {
        ticket: ticket_value,
        slug_hint: slug_value,
        stage: stage_value,
        work_item: work_item_value,
        last_review_report_id,
        updated_at: Some(now),
    };
    store.save(&state)?;
    Ok(state)
}

/// Resolves a `None`-keeps/`Some("")`-clears/`Some(value)`-sets field
/// against `current`.
fn merged_field(requested: Option<&str>, current: Option<&str>) -> Option<String> {
    let raw = match requested {
        Some(value) => value.trim(),
        None => current.unwrap_or("").trim(),
    };
    (!raw.is_empty()).then(|| raw.to_string())
}

/// Sets `ticket`/`slug_hint` on the workflow's active state and, unless
/// `scaffold_prd_file` is `false`, copies `docs/prd/template.md` to
/// `docs/prd/<ticket>.prd.md` when the latter does not already exist
/// (§4.3).
///
/// # Errors
///
/// Returns [`ActiveStateError`] when the active state cannot be read or
/// written.
pub fn write_identifiers(
    store: &dyn ActiveStateStore,
    workflow_root: &Path,
    ticket: &str,
    slug_hint: Option<&str>,
    scaffold_prd_file: bool,
    now: Timestamp,
) -> Result<ActiveState, ActiveStateError> {
    let ticket = ticket.trim();
    let hint = slug_hint.map(normalize_slug_hint_token).filter(|value| !value.is_empty());
    let hint = hint.unwrap_or_else(|| ticket.to_string());

    let state = write_active_state(store, Some(ticket), Some(&hint), None, None, now)?;

    if scaffold_prd_file {
        scaffold_prd(workflow_root, ticket);
    }

    Ok(state)
}

/// Copies `docs/prd/template.md` to `docs/prd/<ticket>.prd.md` when the
/// template exists and the target does not. Failures are swallowed: PRD
/// scaffolding is a convenience, not a correctness requirement.
fn scaffold_prd(workflow_root: &Path, ticket: &str) -> bool {
    if ticket.is_empty() {
        return false;
    }
    let template_path = PRD_TEMPLATE_RELATIVE_PATH.iter().fold(workflow_root.to_path_buf(), |path, segment| path.join(segment));
    let prd_dir = PRD_RELATIVE_DIR.iter().fold(workflow_root.to_path_buf(), |path, segment| path.join(segment));
    let prd_path = prd_dir.join(format!("{ticket}.prd.md"));

    if !template_path.is_file() || prd_path.exists() {
        return false;
    }
    let Ok(content) = fs::read_to_string(&template_path) else {
        return false;
    };
    let content = content.replace("<ticket>", ticket);
    if fs::create_dir_all(&prd_dir).is_err() {
        return false;
    }
    fs::write(&prd_path, content).is_ok()
}

/// Normalizes a raw slug-hint argument down to a compact token, discarding
/// trailing note/answer text a caller may have passed alongside it.
///
/// Accepts only `^[a-z0-9][a-z0-9-]{0,80}$` once lowercased and stripped of
/// a leading `slug=`/`slug:` marker and surrounding quotes/punctuation;
/// anything else normalizes to the empty string.
#[must_use]
pub fn normalize_slug_hint_token(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    let Some(token) = raw.split_whitespace().next() else {
        return String::new();
    };
    let token = token.trim_matches(['"', '\'']);
    if token.is_empty() {
        return String::new();
    }
    let lowered = token.to_ascii_lowercase();
    let stripped = lowered.strip_prefix("slug=").or_else(|| lowered.strip_prefix("slug:")).unwrap_or(&lowered);
    let token = stripped.trim_matches(['"', '\'']).trim_matches([',', ';']);
    if token.is_empty() || !is_slug_hint_token(token) {
        return String::new();
    }
    token.to_string()
}

/// Whether `value` matches the slug-hint token grammar
/// `^[a-z0-9][a-z0-9-]{0,80}$`.
fn is_slug_hint_token(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else { return false };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }
    value.len() <= 81 && chars.clone().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

/// Failure reading or writing active state.
#[derive(Debug, Error)]
pub enum ActiveStateError {
    /// An I/O operation against `path` failed.
    #[error("active state I/O error at {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
    /// The file at `path` could not be decoded as JSON.
    #[error("active state at {0} is not valid JSON: {1}")]
    Decode(PathBuf, #[source] serde_json::Error),
    /// The state could not be encoded as JSON.
    #[error("active state for {0} could not be encoded: {1}")]
    Encode(PathBuf, #[source] serde_json::Error),
    /// The computed path had no parent directory.
    #[error("active state path has no parent directory: {0}")]
    InvalidPath(PathBuf),
    /// A stage name read back from disk no longer parses.
    #[error(transparent)]
    InvalidStage(#[from] StageParseError),
}

#[cfg(test)]
mod tests {
    use super::ActiveState;
    use super::FileActiveStateStore;
    use super::normalize_slug_hint_token;
    use super::write_active_state;
    use super::write_identifiers;
    use crate::core::ids::Ticket;
    use crate::core::stage::Stage;
    use crate::core::time::Timestamp;
    use crate::interfaces::ActiveStateStore as _;
    use tempfile::tempdir;

    fn now() -> Timestamp {
        Timestamp::parse("2026-07-28T00:00:00Z").expect("valid")
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let root = tempdir().expect("tempdir");
        let store = FileActiveStateStore::new(root.path().to_path_buf());
        let state = ActiveState {
            ticket: Some(Ticket::from("AIDD-1")),
            stage: Some(Stage::Idea),
            updated_at: Some(now()),
            ..ActiveState::default()
        };

        store.save(&state).expect("saves");
        let loaded = store.load().expect("loads").expect("present");
        assert_eq!(loaded, state);
    }

    #[test]
    fn missing_state_loads_as_none() {
        let root = tempdir().expect("tempdir");
        let store = FileActiveStateStore::new(root.path().to_path_buf());
        assert_eq!(store.load().expect("loads"), None);
    }

    #[test]
    fn writes_to_a_single_document_under_docs() {
        let root = tempdir().expect("tempdir");
        let store = FileActiveStateStore::new(root.path().to_path_buf());
        write_active_state(&store, Some("AIDD-1"), None, Some(Stage::Idea), None, now()).expect("writes");
        assert!(root.path().join("docs").join(".active.json").is_file());
    }

    #[test]
    fn none_keeps_and_empty_string_clears_a_field() {
        let root = tempdir().expect("tempdir");
        let store = FileActiveStateStore::new(root.path().to_path_buf());
        write_active_state(&store, Some("AIDD-1"), Some("hint"), Some(Stage::Idea), None, now()).expect("writes");

        let kept = write_active_state(&store, None, None, Some(Stage::Research), None, now()).expect("writes");
        assert_eq!(kept.ticket, Some(Ticket::from("AIDD-1")));
        assert_eq!(kept.slug_hint.as_ref().map(|hint| hint.as_str()), Some("hint"));

        let cleared = write_active_state(&store, None, Some(""), None, None, now()).expect("writes");
        assert_eq!(cleared.slug_hint, None);
        assert_eq!(cleared.ticket, Some(Ticket::from("AIDD-1")));
    }

    #[test]
    fn loop_stage_normalizes_a_handoff_id_and_surfaces_the_report_id() {
        let root = tempdir().expect("tempdir");
        let store = FileActiveStateStore::new(root.path().to_path_buf());
        write_active_state(&store, Some("AIDD-1"), None, Some(Stage::Implement), Some("iteration_id=I7"), now())
            .expect("writes");

        let state =
            write_active_state(&store, None, None, Some(Stage::Review), Some("id=review:report-42"), now()).expect("writes");
        assert_eq!(state.work_item.as_deref(), Some("iteration_id=I7"));
        assert_eq!(state.last_review_report_id.as_deref(), Some("review:report-42"));
    }

    #[test]
    fn write_identifiers_normalizes_a_noisy_slug_hint() {
        let root = tempdir().expect("tempdir");
        let store = FileActiveStateStore::new(root.path().to_path_buf());
        let state = write_identifiers(&store, root.path(), "AIDD-1", Some("slug=Retry Limit extra notes"), false, now())
            .expect("writes");
        assert_eq!(state.slug_hint.as_ref().map(|hint| hint.as_str()), Some("retry"));
    }

    #[test]
    fn write_identifiers_falls_back_to_the_ticket_as_the_slug_hint() {
        let root = tempdir().expect("tempdir");
        let store = FileActiveStateStore::new(root.path().to_path_buf());
        let state = write_identifiers(&store, root.path(), "AIDD-1", None, false, now()).expect("writes");
        assert_eq!(state.slug_hint.as_ref().map(|hint| hint.as_str()), Some("AIDD-1"));
    }

    #[test]
    fn write_identifiers_scaffolds_the_prd_from_the_template() {
        let root = tempdir().expect("tempdir");
        let prd_dir = root.path().join("docs").join("prd");
        std::fs::create_dir_all(&prd_dir).expect("mkdir");
        std::fs::write(prd_dir.join("template.md"), "# PRD for <ticket>\n").expect("writes template");

        let store = FileActiveStateStore::new(root.path().to_path_buf());
        write_identifiers(&store, root.path(), "AIDD-1", None, true, now()).expect("writes");

        let prd_text = std::fs::read_to_string(prd_dir.join("AIDD-1.prd.md")).expect("reads");
        assert_eq!(prd_text, "# PRD for AIDD-1\n");
    }

    #[test]
    fn normalizes_a_quoted_slug_marker_token() {
        assert_eq!(normalize_slug_hint_token("\"slug:Retry-Limit\" more text"), "retry-limit");
    }

    #[test]
    fn rejects_a_token_that_does_not_match_the_slug_grammar() {
        assert_eq!(normalize_slug_hint_token("Not_A_Slug"), "");
    }
}
