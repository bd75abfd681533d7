// crates/aidd-core/src/core/gate_result.rs
// ============================================================================
// Module: Gate Result
// Description: The outcome a single preflight gate reports.
// Purpose: Give the gate engine a uniform, serializable result type
//   regardless of which gate produced it.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

/// The status a gate reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// The gate's condition is satisfied.
    Ok,
    /// The gate does not apply in this context and was not evaluated.
    Skipped,
    /// The gate's condition failed; the preflight sequence short-circuits.
    Blocked,
}

/// The result of evaluating one gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// The name of the gate that produced this result.
    pub gate: String,
    /// The status reported by the gate.
    pub status: GateStatus,
    /// A human-readable explanation, required whenever `status` is not
    /// [`GateStatus::Ok`].
    pub message: Option<String>,
}

impl GateResult {
    /// Builds an `Ok` result for `gate`.
    #[must_use]
    pub fn ok(gate: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            status: GateStatus::Ok,
            message: None,
        }
    }

    /// Builds a `Skipped` result for `gate` with `reason`.
    #[must_use]
    pub fn skipped(gate: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            status: GateStatus::Skipped,
            message: Some(reason.into()),
        }
    }

    /// Builds a `Blocked` result for `gate` with `reason`.
    #[must_use]
    pub fn blocked(gate: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            status: GateStatus::Blocked,
            message: Some(reason.into()),
        }
    }

    /// Returns whether this result should stop the preflight sequence.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.status == GateStatus::Blocked
    }
}
