// crates/aidd-gate/src/markdown.rs
// ============================================================================
// Module: Markdown Heuristics
// Description: Pure text functions the built-in gates call to inspect
//   persisted markdown artifacts.
// Purpose: Keep content-parsing heuristics small, testable, and separate
//   from gate composition/short-circuit logic.
// Dependencies: std
// ============================================================================

//! ## Overview
//! These heuristics are intentionally shallow: they look for the marker
//! conventions the stage entrypoints already write (`Q:`/`A:` lines, a
//! `---`-fenced front-matter block, numbered list items), not a full
//! markdown AST. Deeper parsing is out of scope for the gate engine, which
//! only needs yes/no readiness answers.

use std::collections::BTreeMap;

/// Counts paired `Q:`/`A:` lines in `text`.
///
/// A pair requires a non-blank answer on the line immediately following a
/// question; an unanswered trailing question is not counted.
#[must_use]
pub fn count_answered_questions(text: &str) -> u32 {
    let lines: Vec<&str> = text.lines().collect();
    let mut count = 0;
    let mut index = 0;
    while index < lines.len() {
        let line = lines[index].trim_start();
        if let Some(rest) = line.strip_prefix("Q:")
            && !rest.trim().is_empty()
            && let Some(next) = lines.get(index + 1)
            && let Some(answer) = next.trim_start().strip_prefix("A:")
            && !answer.trim().is_empty()
        {
            count += 1;
            index += 2;
            continue;
        }
        index += 1;
    }
    count
}

/// Extracts a simple `key: value` front-matter block delimited by `---`
/// fences at the start of `text`.
///
/// Returns an empty map when `text` does not open with a front-matter
/// fence.
#[must_use]
pub fn extract_front_matter(text: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut lines = text.lines();
    let Some(first) = lines.next() else {
        return fields;
    };
    if first.trim() != "---" {
        return fields;
    }
    for line in lines {
        if line.trim() == "---" {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    fields
}

/// Returns whether `text` contains at least one markdown heading exactly
/// matching `heading` (after trimming leading `#` markers and whitespace).
#[must_use]
pub fn has_heading(text: &str, heading: &str) -> bool {
    text.lines()
        .map(|line| line.trim_start_matches('#').trim())
        .any(|candidate| candidate == heading)
}

/// Returns whether `text` contains a contiguous `1.`, `2.`, `3.`, ...
/// numbered list of at least one item.
#[must_use]
pub fn has_contiguous_numbered_list(text: &str) -> bool {
    let numbers: Vec<u32> = text
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            let dot = trimmed.find('.')?;
            trimmed[..dot].parse::<u32>().ok()
        })
        .collect();

    if numbers.is_empty() || numbers[0] != 1 {
        return false;
    }
    numbers.windows(2).all(|pair| pair[1] == pair[0] + 1)
}

#[cfg(test)]
mod tests {
    use super::count_answered_questions;
    use super::extract_front_matter;
    use super::has_contiguous_numbered_list;
    use super::has_heading;

    #[test]
    fn counts_only_fully_answered_questions() {
        let text = "Q: first?\nA: yes\nQ: second?\n";
        assert_eq!(count_answered_questions(text), 1);
    }

    #[test]
    fn extracts_front_matter_fields() {
        let text = "---\nstatus: approved\nowner: team\n---\nbody text\n";
        let fields = extract_front_matter(text);
        assert_eq!(fields.get("status").map(String::as_str), Some("approved"));
    }

    #[test]
    fn missing_front_matter_fence_yields_empty_map() {
        assert!(extract_front_matter("no fence here").is_empty());
    }

    #[test]
    fn finds_an_exact_heading_match() {
        assert!(has_heading("# Title\n## Approach\nbody", "Approach"));
        assert!(!has_heading("## Approach Overview", "Approach"));
    }

    #[test]
    fn detects_a_contiguous_numbered_list() {
        let text = "intro\n1. first\n2. second\n3. third\n";
        assert!(has_contiguous_numbered_list(text));
    }

    #[test]
    fn rejects_a_list_with_a_gap() {
        let text = "1. first\n3. third\n";
        assert!(!has_contiguous_numbered_list(text));
    }
}
