// crates/aidd-core/src/core/pathglob.rs
// ============================================================================
// Module: Path Glob Matching
// Description: Small glob matcher for branch filters, diff-boundary lists,
//   and hook readmap/writemap entries.
// Purpose: Share one glob implementation between the gate engine and the
//   hook policy instead of duplicating pattern translation.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Patterns support `*` (any run of characters except `/`), `**` (any run of
//! characters including `/`), and `?` (a single character except `/`).
//! Everything else is matched literally. This is deliberately smaller than a
//! full gitignore-style matcher: the consumers of this module only ever
//! match against a short, explicit list of configured patterns.

use regex::Regex;
use thiserror::Error;

/// A compiled glob pattern.
pub struct PathGlob {
    /// The original pattern, kept for diagnostics.
    pattern: String,
    /// The compiled matcher.
    regex: Regex,
}

impl PathGlob {
    /// Compiles `pattern` into a matcher.
    ///
    /// # Errors
    ///
    /// Returns [`PathGlobError`] when the translated pattern is not a valid
    /// regular expression, which should not happen for any input composed of
    /// `*`, `**`, `?`, and literal path characters.
    pub fn compile(pattern: &str) -> Result<Self, PathGlobError> {
        let translated = translate(pattern);
        let regex = Regex::new(&translated)
            .map_err(|err| PathGlobError::Invalid(pattern.to_string(), err.to_string()))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Returns whether `candidate` matches this glob.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// Returns the original, uncompiled pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Returns whether any pattern in `patterns` matches `candidate`.
///
/// Invalid patterns are skipped rather than causing the whole list to fail;
/// callers that need strict validation should compile patterns up front with
/// [`PathGlob::compile`].
#[must_use]
pub fn any_matches<'a>(patterns: impl IntoIterator<Item = &'a str>, candidate: &str) -> bool {
    patterns
        .into_iter()
        .filter_map(|pattern| PathGlob::compile(pattern).ok())
        .any(|glob| glob.matches(candidate))
}

/// Translates a glob pattern into an anchored regular expression.
fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            '.' | '+' | '(' | ')' | '|' | '^' | '$' | '[' | ']' | '{' | '}' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            other => out.push(other),
        }
    }
    out.push('$');
    out
}

/// Failure compiling a path glob.
#[derive(Debug, Error)]
pub enum PathGlobError {
    /// The pattern translated to an invalid regular expression.
    #[error("invalid glob pattern {0:?}: {1}")]
    Invalid(String, String),
}

#[cfg(test)]
mod tests {
    use super::{PathGlob, any_matches};

    #[test]
    fn single_star_does_not_cross_path_separators() {
        let glob = PathGlob::compile("src/*.rs").expect("compiles");
        assert!(glob.matches("src/lib.rs"));
        assert!(!glob.matches("src/core/lib.rs"));
    }

    #[test]
    fn double_star_crosses_path_separators() {
        let glob = PathGlob::compile("src/**/*.rs").expect("compiles");
        assert!(glob.matches("src/core/ids.rs"));
    }

    #[test]
    fn any_matches_checks_every_pattern() {
        assert!(any_matches(["docs/*.md", "src/**"], "src/core/ids.rs"));
        assert!(!any_matches(["docs/*.md"], "src/core/ids.rs"));
    }
}
