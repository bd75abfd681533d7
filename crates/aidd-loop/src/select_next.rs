// crates/aidd-loop/src/select_next.rs
// ============================================================================
// Module: Next-Work-Item Selection
// Description: Picks the next open tasklist iteration once a review comes
//   back done.
// Purpose: Drive the loop runner from one work item to the next without a
//   human re-dispatching implement by hand.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The tasklist is a plain numbered list of iterations, each carrying an
//! open/done checkbox and an `iteration_id=...` key, plus an optional
//! `AIDD:NEXT_3` section naming the iterations that should be picked up
//! first. [`select_next_work_item`] prefers `AIDD:NEXT_3` references over
//! tasklist order, since that section exists precisely to let a human steer
//! which iteration comes next.

const NEXT_3_HEADING: &str = "AIDD:NEXT_3";

/// One row of the tasklist's numbered iteration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasklistEntry {
    /// The iteration key, e.g. `iteration_id=I3`.
    pub key: String,
    /// Whether this iteration's checkbox is already marked done.
    pub done: bool,
}

/// Parses a tasklist document into its ordered iteration entries.
///
/// Recognizes lines of the shape `N. [ ] iteration_id=... — description` or
/// `N. [x] iteration_id=... — description`; any line that does not match is
/// ignored.
#[must_use]
pub fn parse_tasklist_entries(text: &str) -> Vec<TasklistEntry> {
    text.lines().filter_map(parse_entry_line).collect()
}

/// Parses a single tasklist line into a [`TasklistEntry`], if it matches the
/// expected shape.
fn parse_entry_line(line: &str) -> Option<TasklistEntry> {
    let trimmed = line.trim_start();
    let after_number = trimmed.split_once('.')?.1.trim_start();
    let after_number = after_number.strip_prefix('[')?;
    let (checkbox, rest) = after_number.split_once(']')?;
    let done = matches!(checkbox.trim(), "x" | "X");
    let key = rest.trim_start().split(['—', '-']).next()?.trim();
    if key.is_empty() {
        return None;
    }
    Some(TasklistEntry { key: key.to_string(), done })
}

/// Parses the ordered list of iteration keys referenced under the
/// `AIDD:NEXT_3` heading, in document order.
#[must_use]
pub fn parse_next_3(text: &str) -> Vec<String> {
    let mut lines = text.lines();
    let Some(_) = lines.by_ref().find(|line| line.trim_start_matches('#').trim() == NEXT_3_HEADING) else {
        return Vec::new();
    };
    lines
        .take_while(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| {
            let trimmed = line.trim_start().trim_start_matches(['-', '*']).trim();
            if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
        })
        .collect()
}

/// Selects the next work item once a review comes back done.
///
/// Returns the first open entry referenced from `AIDD:NEXT_3` (excluding
/// `current_key`), falling back to the first open entry in tasklist order.
/// Returns `None` when every entry is done or the tasklist has no open
/// entries besides the current one.
#[must_use]
pub fn select_next_work_item(tasklist_text: &str, current_key: &str) -> Option<String> {
    let entries = parse_tasklist_entries(tasklist_text);
    let is_open = |key: &str| entries.iter().any(|entry| entry.key == key && !entry.done);

    for candidate in parse_next_3(tasklist_text) {
        if candidate != current_key && is_open(&candidate) {
            return Some(candidate);
        }
    }

    entries
        .into_iter()
        .find(|entry| !entry.done && entry.key != current_key)
        .map(|entry| entry.key)
}
