// crates/aidd-loop/src/qa_repair.rs
// ============================================================================
// Module: QA-Repair Work Item Selection
// Description: Picks which work item a QA-repair loop run switches to
//   `implement` for.
// Purpose: Resolve the under-specified interaction between an explicit
//   work-item argument, an explicit handoff selection, and auto-scanning
//   blocking QA handoffs, failing closed rather than guessing.
// Dependencies: aidd-core
// ============================================================================

//! ## Overview
//! A QA repair run may be told which work item to repair in three ways: an
//! explicit `--work-item-key`, an explicit `--select-qa-handoff`, or neither
//! (auto mode, which scans the blocking `<!-- handoff:qa key=... -->`
//! markers left by the last QA stage and promotes the first one found). When
//! both explicit knobs are given and they disagree, this module reports
//! `qa_repair_ambiguous` rather than silently preferring one, per the
//! resolved interpretation of the source's "first qualifying iteration"
//! language.

use thiserror::Error;

/// Failure selecting a QA-repair work item.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QaRepairError {
    /// An explicit `--work-item-key` and `--select-qa-handoff` were both
    /// given and named different handoffs.
    #[error("qa_repair_ambiguous: --work-item-key and --select-qa-handoff disagree")]
    Ambiguous,
    /// Neither explicit knob was given and no blocking handoff marker was
    /// found to auto-promote.
    #[error("no qualifying QA handoff found to repair")]
    NoQualifyingHandoff,
}

/// Scans `text` for `<!-- handoff:qa key=... -->` markers, returning the
/// referenced keys in document order.
#[must_use]
pub fn scan_qa_handoffs(text: &str) -> Vec<String> {
    text.lines().filter_map(parse_handoff_marker).collect()
}

/// Parses a single `<!-- handoff:qa key=... -->` marker line, if present.
fn parse_handoff_marker(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix("<!--")?.strip_suffix("-->")?.trim();
    let rest = inner.strip_prefix("handoff:qa")?.trim();
    let (_, value) = rest.split_once("key=")?;
    let key = value.split_whitespace().next()?.trim();
    if key.is_empty() { None } else { Some(key.to_string()) }
}

/// Selects the work item a QA-repair loop run should switch `implement` to.
///
/// # Errors
///
/// Returns [`QaRepairError::Ambiguous`] when `work_item_key` and
/// `select_qa_handoff` are both given and disagree, or
/// [`QaRepairError::NoQualifyingHandoff`] when neither is given and
/// `blocking_handoffs` is empty.
pub fn select_qa_repair_work_item(
    work_item_key: Option<&str>,
    select_qa_handoff: Option<&str>,
    blocking_handoffs: &[String],
) -> Result<String, QaRepairError> {
    if let (Some(explicit), Some(selected)) = (work_item_key, select_qa_handoff)
        && explicit != selected
    {
        return Err(QaRepairError::Ambiguous);
    }

    if let Some(key) = work_item_key.or(select_qa_handoff) {
        return Ok(key.to_string());
    }

    blocking_handoffs.first().cloned().ok_or(QaRepairError::NoQualifyingHandoff)
}

#[cfg(test)]
mod tests {
    use super::QaRepairError;
    use super::scan_qa_handoffs;
    use super::select_qa_repair_work_item;

    #[test]
    fn scans_handoff_markers_in_order() {
        let text = "intro\n<!-- handoff:qa key=H1 -->\nbody\n<!-- handoff:qa key=H2 -->\n";
        assert_eq!(scan_qa_handoffs(text), vec!["H1".to_string(), "H2".to_string()]);
    }

    #[test]
    fn ignores_unrelated_html_comments() {
        let text = "<!-- not a handoff marker -->\n";
        assert!(scan_qa_handoffs(text).is_empty());
    }

    #[test]
    fn auto_promotes_the_first_blocking_handoff() {
        let handoffs = vec!["H1".to_string(), "H2".to_string()];
        let work_item = select_qa_repair_work_item(None, None, &handoffs).expect("selects");
        assert_eq!(work_item, "H1");
    }

    #[test]
    fn errors_when_no_explicit_key_and_no_handoffs_found() {
        let result = select_qa_repair_work_item(None, None, &[]);
        assert_eq!(result, Err(QaRepairError::NoQualifyingHandoff));
    }

    #[test]
    fn prefers_an_explicit_work_item_key() {
        let handoffs = vec!["H1".to_string()];
        let work_item = select_qa_repair_work_item(Some("H2"), None, &handoffs).expect("selects");
        assert_eq!(work_item, "H2");
    }

    #[test]
    fn agreeing_explicit_knobs_are_accepted() {
        let work_item = select_qa_repair_work_item(Some("H3"), Some("H3"), &[]).expect("selects");
        assert_eq!(work_item, "H3");
    }

    #[test]
    fn disagreeing_explicit_knobs_are_ambiguous() {
        let result = select_qa_repair_work_item(Some("H1"), Some("H2"), &[]);
        assert_eq!(result, Err(QaRepairError::Ambiguous));
    }
}
