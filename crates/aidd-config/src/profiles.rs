// crates/aidd-config/src/profiles.rs
// ============================================================================
// Module: Host Profile Resolver
// Description: Built-in host profile table and the functions that select,
//   strip, and expand it into concrete skill directories.
// Purpose: Let the dispatcher behave correctly whether it is invoked from
//   kimi, codex, cursor, or an unrecognized host.
// Dependencies: aidd-core
// ============================================================================

//! ## Overview
//! The set of host profiles is small and closed, so it is a compiled-in
//! table rather than a config file (Design Note "Dynamic dispatch tables →
//! static tables"). Hosts that prefix commands with `<host>:` (for example
//! `codex:research`) are stripped by [`strip_host_prefix`] before the
//! command reaches the dispatch table.

use std::path::Path;
use std::path::PathBuf;

use aidd_core::HostProfile;

/// Profile name used when no more specific profile matches.
const DEFAULT_PROFILE_NAME: &str = "default";

/// Returns the built-in profile for `name`, falling back to the default
/// profile for unrecognized names.
#[must_use]
pub fn select_profile(name: &str) -> HostProfile {
    match name.to_ascii_lowercase().as_str() {
        "kimi" => HostProfile {
            name: "kimi".to_string(),
            skills_dirs: vec![".aidd-plugin/skills/kimi".to_string(), "skills".to_string()],
            strips_host_prefix: false,
        },
        "codex" => HostProfile {
            name: "codex".to_string(),
            skills_dirs: vec![
                ".aidd-plugin/skills/codex".to_string(),
                ".codex/skills".to_string(),
                "skills".to_string(),
            ],
            strips_host_prefix: true,
        },
        "cursor" => HostProfile {
            name: "cursor".to_string(),
            skills_dirs: vec![
                ".aidd-plugin/skills/cursor".to_string(),
                ".cursor/skills".to_string(),
                "skills".to_string(),
            ],
            strips_host_prefix: true,
        },
        _ => HostProfile {
            name: DEFAULT_PROFILE_NAME.to_string(),
            skills_dirs: vec!["skills".to_string()],
            strips_host_prefix: false,
        },
    }
}

/// Strips a `<host>:` prefix from `command`, if `profile` expects one and
/// the prefix matches.
///
/// Returns the bare command name unchanged when the profile does not strip
/// prefixes, or when `command` does not carry the expected prefix.
#[must_use]
pub fn strip_host_prefix<'a>(profile: &HostProfile, command: &'a str) -> &'a str {
    if !profile.strips_host_prefix {
        return command;
    }
    let prefix = format!("{}:", profile.name);
    command.strip_prefix(prefix.as_str()).unwrap_or(command)
}

/// Resolves the profile for `host_hint`, then strips any host prefix from
/// `command`, returning `(profile, bare_command)`.
#[must_use]
pub fn resolve_profile<'a>(host_hint: &str, command: &'a str) -> (HostProfile, &'a str) {
    let profile = select_profile(host_hint);
    let bare_command = strip_host_prefix(&profile, command);
    (profile, bare_command)
}

/// Returns the subset of `profile.skills_dirs` that exist under
/// `workspace_root`, in priority order.
#[must_use]
pub fn discover_skills_dirs(workspace_root: &Path, profile: &HostProfile) -> Vec<PathBuf> {
    profile
        .skills_dirs
        .iter()
        .map(|dir| workspace_root.join(dir))
        .filter(|path| path.is_dir())
        .collect()
}
