// crates/aidd-cli/src/runtime_context.rs
// ============================================================================
// Module: Runtime Context
// Description: Snapshots the process environment once at startup into a
//   plain struct, instead of re-reading `std::env::var` scattered through
//   the command handlers.
// Purpose: Give every subcommand one consistent view of the host/profile
//   overrides, hook-policy mode, and debug toggle a caller can set via
//   environment variables.
// Dependencies: aidd-hooks
// ============================================================================

//! ## Overview
//! Every environment variable this binary reads is read exactly once, here,
//! at the top of [`crate::run`]. Subcommands take a `&RuntimeContext`
//! instead of touching the environment directly, so a given invocation's
//! behavior is fully determined by its arguments plus one immutable
//! snapshot, not by re-reading mutable global state mid-command.

use std::env;

use aidd_hooks::HooksMode;

/// How aggressively stale context is discarded between turns, per
/// `AIDD_CONTEXT_GC`.
///
/// This system has no library-level context-GC implementation; the
/// variable is accepted and surfaced (e.g. by `aidd config show`) for
/// parity with the external interface contract, but nothing in this binary
/// currently branches on it beyond recording the requested mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextGcMode {
    /// Full garbage collection between turns.
    Full,
    /// A lighter sweep that leaves recently-touched files resident.
    Light,
    /// Garbage collection disabled entirely.
    Off,
}

impl ContextGcMode {
    /// Parses a context-GC mode from its environment-variable spelling,
    /// falling back to [`ContextGcMode::Full`] for an unset or unrecognized
    /// value.
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("light") => Self::Light,
            Some("off") => Self::Off,
            _ => Self::Full,
        }
    }
}

/// One immutable snapshot of every `AIDD_*` environment variable this
/// binary recognizes, taken once at startup.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// `AIDD_ROOT`: overrides the directory root discovery starts its
    /// ancestor walk from, when set.
    pub root: Option<String>,
    /// `AIDD_IDE_PROFILE`: the IDE/agent-host profile name, when the
    /// caller did not pass `--host` explicitly.
    pub ide_profile: Option<String>,
    /// `AIDD_HOST`: same role as `ide_profile`, checked first.
    pub host: Option<String>,
    /// `AIDD_SKILLS_DIRS`: a colon-separated list of additional skill
    /// directories, layered on top of the resolved host profile's own
    /// list.
    pub skills_dirs: Vec<String>,
    /// `AIDD_HOOKS_MODE`: `fast` (warn) or `strict` (deny), defaulting to
    /// `fast` when unset or unrecognized.
    pub hooks_mode: HooksMode,
    /// `AIDD_CONTEXT_GC`: `full`, `light`, or `off`.
    pub context_gc: ContextGcMode,
    /// `AIDD_SKIP_STAGE_WRAPPERS`: when true, callers asked the dispatcher
    /// to bypass stage wrapper scripts. Surfaced for parity; the
    /// dispatcher's entrypoint table is compiled in and does not currently
    /// distinguish wrapped from unwrapped entrypoints.
    pub skip_stage_wrappers: bool,
    /// `AIDD_STAGE_DISPATCH_GATES`: surfaced for parity with the external
    /// interface contract. The dispatcher gates solely on each command's
    /// `requires_workflow` flag (see `aidd-config::dispatch_table`), so
    /// this value does not change dispatch behavior.
    pub stage_dispatch_gates: bool,
    /// Host-hint override, resolved in priority order from
    /// `AIDD_LOOP_RUNNER`, then `AIDD_LOOP_RUNNER_HINT`, then
    /// `AIDD_RUNNER`.
    pub runner_hint: Option<String>,
    /// `AIDD_ACTIVE_STAGE`: a display-only override for `aidd status`,
    /// shown instead of the persisted active state's stage when present.
    pub active_stage_override: Option<String>,
    /// `AIDD_DEBUG`: when true, CLI errors render their full `Debug`
    /// representation instead of a single-line message.
    pub debug: bool,
    /// The hook event payload, read from `HOOK_PAYLOAD` first, then
    /// `AIDD_HOOK_PAYLOAD`.
    pub hook_payload: Option<String>,
    /// `AIDD_ALLOW_FALLBACK_PREFLIGHT`: acknowledged for compatibility with
    /// the external interface contract's legacy preflight fallback path.
    /// Nothing in this workspace reads or writes that legacy path, so the
    /// flag is read-only/no-op here by construction rather than by an
    /// explicit branch.
    pub allow_fallback_preflight: bool,
}

impl RuntimeContext {
    /// Builds a [`RuntimeContext`] from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            root: read_var("AIDD_ROOT"),
            ide_profile: read_var("AIDD_IDE_PROFILE"),
            host: read_var("AIDD_HOST"),
            skills_dirs: read_var("AIDD_SKILLS_DIRS")
                .map(|raw| raw.split(':').filter(|part| !part.is_empty()).map(str::to_string).collect())
                .unwrap_or_default(),
            hooks_mode: parse_hooks_mode(read_var("AIDD_HOOKS_MODE").as_deref()),
            context_gc: ContextGcMode::parse(read_var("AIDD_CONTEXT_GC").as_deref()),
            skip_stage_wrappers: read_bool("AIDD_SKIP_STAGE_WRAPPERS"),
            stage_dispatch_gates: read_bool("AIDD_STAGE_DISPATCH_GATES"),
            runner_hint: read_var("AIDD_LOOP_RUNNER").or_else(|| read_var("AIDD_LOOP_RUNNER_HINT")).or_else(|| read_var("AIDD_RUNNER")),
            active_stage_override: read_var("AIDD_ACTIVE_STAGE"),
            debug: read_bool("AIDD_DEBUG"),
            hook_payload: read_var("HOOK_PAYLOAD").or_else(|| read_var("AIDD_HOOK_PAYLOAD")),
            allow_fallback_preflight: read_bool("AIDD_ALLOW_FALLBACK_PREFLIGHT"),
        }
    }

    /// Resolves the effective host hint for this invocation: an explicit
    /// `--host` argument wins, then `AIDD_HOST`, then `AIDD_IDE_PROFILE`,
    /// then the `default` profile.
    #[must_use]
    pub fn resolve_host(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| self.host.clone())
            .or_else(|| self.ide_profile.clone())
            .unwrap_or_else(|| "default".to_string())
    }
}

/// Reads an environment variable, treating an empty value the same as an
/// unset one.
fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Reads an environment variable as a boolean flag: `1`, `true`, and `yes`
/// (case-insensitive) are true; anything else, including unset, is false.
fn read_bool(name: &str) -> bool {
    matches!(read_var(name).map(|value| value.to_ascii_lowercase()).as_deref(), Some("1" | "true" | "yes"))
}

/// Parses `AIDD_HOOKS_MODE`, defaulting to [`HooksMode::Fast`].
fn parse_hooks_mode(raw: Option<&str>) -> HooksMode {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("strict") => HooksMode::Strict,
        _ => HooksMode::Fast,
    }
}

#[cfg(test)]
mod tests {
    use super::ContextGcMode;
    use super::parse_hooks_mode;
    use aidd_hooks::HooksMode;

    #[test]
    fn unset_hooks_mode_defaults_to_fast() {
        assert_eq!(parse_hooks_mode(None), HooksMode::Fast);
    }

    #[test]
    fn strict_hooks_mode_is_recognized_case_insensitively() {
        assert_eq!(parse_hooks_mode(Some("STRICT")), HooksMode::Strict);
    }

    #[test]
    fn unrecognized_context_gc_mode_falls_back_to_full() {
        assert_eq!(ContextGcMode::parse(Some("bogus")), ContextGcMode::Full);
    }

    #[test]
    fn recognizes_light_and_off_context_gc_modes() {
        assert_eq!(ContextGcMode::parse(Some("light")), ContextGcMode::Light);
        assert_eq!(ContextGcMode::parse(Some("off")), ContextGcMode::Off);
    }
}
