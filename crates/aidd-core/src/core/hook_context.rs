// crates/aidd-core/src/core/hook_context.rs
// ============================================================================
// Module: Hook Context Entity
// Description: The input a hook policy decision is made from.
// Purpose: Give `aidd-hooks` a typed request shape independent of how the
//   calling agent host serializes tool calls.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

/// The tool an agent host is about to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ToolName {
    /// Reads a file.
    Read,
    /// Overwrites a file.
    Write,
    /// Edits part of a file.
    Edit,
    /// Lists files matching a pattern.
    Glob,
    /// Runs a shell command.
    Bash,
}

/// The context a `PreToolUse`/`UserPromptSubmit` decision is made from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookContext {
    /// The tool about to be invoked.
    pub tool_name: ToolName,
    /// The path argument, for file-touching tools.
    pub path: Option<String>,
    /// The shell command, for `Bash`.
    pub command: Option<String>,
    /// The scope key the invoking session is operating under.
    pub scope_key: String,
}
