// crates/aidd-gate/src/context.rs
// ============================================================================
// Module: Gate Context
// Description: The read-only context a gate evaluates against.
// Purpose: Give every gate the same view of the workflow regardless of which
//   stage is about to run.
// Dependencies: aidd-core
// ============================================================================

use std::path::PathBuf;

use aidd_core::ScopeKey;
use aidd_core::Stage;
use aidd_core::Ticket;

/// Read-only context a [`crate::Gate`] evaluates against.
#[derive(Debug, Clone)]
pub struct GateContext {
    /// The workspace root (contains `reports/`, `config/`).
    pub workspace_root: PathBuf,
    /// The ticket the workflow is operating on.
    pub ticket: Ticket,
    /// The sanitized scope key.
    pub scope_key: ScopeKey,
    /// The stage about to run, i.e. the stage this preflight protects.
    pub stage: Stage,
    /// The current branch name, when known.
    pub branch: Option<String>,
    /// Paths changed since the workflow's base revision, when known.
    pub changed_files: Vec<PathBuf>,
}

impl GateContext {
    /// Returns the directory under `reports/` for `segment` and this
    /// context's scope key, e.g. `reports/research/AIDD-142`.
    #[must_use]
    pub fn report_dir(&self, segment: &str) -> PathBuf {
        self.workspace_root
            .join("reports")
            .join(segment)
            .join(self.scope_key.as_str())
    }
}
