// crates/aidd-runner/src/env.rs
// ============================================================================
// Module: Runtime Environment
// Description: Builds the environment a stage entrypoint subprocess runs
//   with.
// Purpose: Keep the child process's environment small and predictable
//   instead of forwarding the dispatcher's full environment unexamined.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The child only ever inherits a short allow-list of variables plus
//! whatever the caller explicitly passes in `overrides`; everything else in
//! the dispatcher's own environment is dropped.

use std::collections::BTreeMap;
use std::env;

/// Environment variable names forwarded from the dispatcher's own
/// environment when present.
const INHERITED_VARS: [&str; 4] = ["PATH", "HOME", "LANG", "TERM"];

/// Builds the environment map passed to a stage entrypoint subprocess.
///
/// Inherited variables (see [`INHERITED_VARS`]) are applied first, then
/// `overrides` are layered on top, so callers can always force a value
/// regardless of the dispatcher's own environment.
#[must_use]
pub fn build_runtime_env(overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut built = BTreeMap::new();
    for name in INHERITED_VARS {
        if let Ok(value) = env::var(name) {
            built.insert(name.to_string(), value);
        }
    }
    for (key, value) in overrides {
        built.insert(key.clone(), value.clone());
    }
    built
}

#[cfg(test)]
mod tests {
    use super::build_runtime_env;
    use std::collections::BTreeMap;

    #[test]
    fn overrides_take_precedence_over_inherited_vars() {
        // SAFETY: test runs single-threaded within this process; no other
        // test reads PATH concurrently.
        unsafe {
            std::env::set_var("PATH", "/usr/bin");
        }
        let mut overrides = BTreeMap::new();
        overrides.insert("PATH".to_string(), "/custom/bin".to_string());

        let built = build_runtime_env(&overrides);
        assert_eq!(built.get("PATH").map(String::as_str), Some("/custom/bin"));
    }

    #[test]
    fn unlisted_variables_are_not_forwarded() {
        // SAFETY: test runs single-threaded within this process.
        unsafe {
            std::env::set_var("AIDD_RUNNER_TEST_SECRET", "should-not-leak");
        }
        let built = build_runtime_env(&BTreeMap::new());
        assert!(!built.contains_key("AIDD_RUNNER_TEST_SECRET"));
    }
}
