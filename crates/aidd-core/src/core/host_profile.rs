// crates/aidd-core/src/core/host_profile.rs
// ============================================================================
// Module: Host Profile Entity
// Description: The resolved set of agent-host conventions a dispatch
//   invocation runs under.
// Purpose: Decouple the dispatcher from the static profile table, which
//   lives in `aidd-config`.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

/// A resolved host profile.
///
/// # Invariants
/// - `name` is always one of the built-in profile names or a bare host
///   prefix that was not recognized, never an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProfile {
    /// The resolved profile name, e.g. `kimi`, `codex`, `cursor`.
    pub name: String,
    /// Directories searched for skill definitions, in priority order.
    pub skills_dirs: Vec<String>,
    /// Whether this host's CLI passes commands with a `<host>:` prefix that
    /// must be stripped before dispatch-spec lookup.
    pub strips_host_prefix: bool,
}
