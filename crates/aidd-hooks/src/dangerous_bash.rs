// crates/aidd-hooks/src/dangerous_bash.rs
// ============================================================================
// Module: Dangerous Bash Matching & Output Wrapping
// Description: Regex pattern sets classifying a shell command as dangerous,
//   and the rewrite that tees a large-output command to a log file.
// Purpose: Give the hook policy the two shell-specific decisions it needs:
//   "should this command be blocked/confirmed" and "should this command's
//   output be wrapped so it does not flood the agent's context".
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Both pattern sets are small and reviewed by hand, matching the teacher's
//! convention of compiling a short, explicit list rather than a generic
//! command-intent classifier. [`wrap_large_output_command`] only rewrites a
//! command when it matches [`LARGE_OUTPUT_PATTERNS`]; callers are expected
//! to check [`classify_dangerous`] first, since a command can be both
//! dangerous and large-output (the dangerous classification wins).

use regex::Regex;

/// `(name, pattern)` pairs describing commands the hook policy treats as
/// dangerous, checked in order.
const DANGEROUS_PATTERNS: &[(&str, &str)] = &[
    ("rm_rf", r"\brm\s+(-[a-zA-Z]*f[a-zA-Z]*r[a-zA-Z]*|-[a-zA-Z]*r[a-zA-Z]*f[a-zA-Z]*|--recursive\s+--force|--force\s+--recursive)\b"),
    ("git_reset_hard", r"\bgit\s+reset\s+--hard\b"),
    ("git_push_force", r"\bgit\s+push\s+(.*\s+)?--force\b"),
    ("git_clean_force", r"\bgit\s+clean\s+(-[a-zA-Z]*f[a-zA-Z]*d?[a-zA-Z]*|-[a-zA-Z]*d[a-zA-Z]*f[a-zA-Z]*)\b"),
    ("chmod_777", r"\bchmod\s+(-R\s+)?0?777\b"),
    ("curl_pipe_shell", r"\b(curl|wget)\b[^|]*\|\s*(sudo\s+)?(sh|bash|zsh)\b"),
    ("dd_to_device", r"\bdd\s+.*\bof=/dev/"),
    ("sudo_rm", r"\bsudo\s+rm\b"),
];

/// `(name, pattern)` pairs naming commands whose output is large enough to
/// warrant teeing to a log file and showing only the tail inline.
const LARGE_OUTPUT_PATTERNS: &[(&str, &str)] = &[
    ("npm_test", r"\bnpm\s+(run\s+)?test\b"),
    ("cargo_test", r"\bcargo\s+test\b"),
    ("cargo_build", r"\bcargo\s+build\b"),
    ("pytest", r"\bpytest\b"),
    ("make_build", r"\bmake\b"),
    ("log_tail", r"\btail\s+-f\b"),
];

/// A dangerous-command match, naming which pattern fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DangerousMatch {
    /// The stable name of the pattern that matched.
    pub name: &'static str,
}

/// Classifies `command` against [`DANGEROUS_PATTERNS`], returning the first
/// match, if any.
#[must_use]
pub fn classify_dangerous(command: &str) -> Option<DangerousMatch> {
    first_match(DANGEROUS_PATTERNS, command).map(|name| DangerousMatch { name })
}

/// Returns whether `command` matches any [`LARGE_OUTPUT_PATTERNS`] entry.
#[must_use]
pub fn is_large_output_command(command: &str) -> bool {
    first_match(LARGE_OUTPUT_PATTERNS, command).is_some()
}

/// Returns the name of the first pattern in `patterns` that matches `text`.
fn first_match(patterns: &[(&'static str, &str)], text: &str) -> Option<&'static str> {
    patterns
        .iter()
        .find(|(_, pattern)| Regex::new(pattern).is_ok_and(|re| re.is_match(text)))
        .map(|(name, _)| *name)
}

/// Rewrites `command` into a `bash -lc` invocation that tees its full
/// output to a timestamped log file under `log_dir` and prints only the
/// last `tail_lines` lines inline, matching the external interface
/// contract's boundary scenario 5.
///
/// `log_marker` is a caller-supplied unique token (normally a timestamp)
/// used to name the log file, since this module may not call
/// `SystemTime::now` itself to stay deterministically testable.
#[must_use]
pub fn wrap_large_output_command(command: &str, log_dir: &str, tail_lines: u32, log_marker: &str) -> String {
    let log_file = format!("{log_dir}/bash-{log_marker}.log");
    let escaped_command = command.replace('\'', "'\\''");
    format!(
        "bash -lc 'mkdir -p {log_dir}; LOG_FILE=\"{log_file}\"; ({escaped_command}) >\"$LOG_FILE\" 2>&1; status=$?; tail -n {tail_lines} \"$LOG_FILE\"; exit $status'"
    )
}

#[cfg(test)]
mod tests {
    use super::classify_dangerous;
    use super::is_large_output_command;
    use super::wrap_large_output_command;

    #[test]
    fn flags_rm_rf() {
        assert_eq!(classify_dangerous("rm -rf /tmp/scratch").map(|m| m.name), Some("rm_rf"));
    }

    #[test]
    fn flags_git_reset_hard() {
        assert!(classify_dangerous("git reset --hard HEAD~1").is_some());
    }

    #[test]
    fn flags_git_push_force() {
        assert!(classify_dangerous("git push origin main --force").is_some());
    }

    #[test]
    fn does_not_flag_an_ordinary_command() {
        assert!(classify_dangerous("npm test").is_none());
    }

    #[test]
    fn recognizes_large_output_commands() {
        assert!(is_large_output_command("npm test"));
        assert!(is_large_output_command("cargo build --release"));
        assert!(!is_large_output_command("ls -la"));
    }

    #[test]
    fn wraps_a_command_with_tee_and_tail() {
        let wrapped = wrap_large_output_command("npm test", "aidd/reports/logs", 200, "20260728-000000");
        assert!(wrapped.starts_with("bash -lc '"));
        assert!(wrapped.contains("(npm test) >\"$LOG_FILE\" 2>&1"));
        assert!(wrapped.contains("tail -n 200 \"$LOG_FILE\""));
        assert!(wrapped.contains("exit $status"));
    }

    #[test]
    fn escapes_single_quotes_in_the_wrapped_command() {
        let wrapped = wrap_large_output_command("echo 'hi'", "aidd/reports/logs", 10, "x");
        assert!(wrapped.contains(r"echo '\''hi'\'''"));
    }
}
