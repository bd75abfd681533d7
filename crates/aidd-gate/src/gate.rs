// crates/aidd-gate/src/gate.rs
// ============================================================================
// Module: Gate Trait
// Description: The interface every built-in and future gate implements.
// Purpose: Let the preflight composer treat every gate uniformly.
// Dependencies: aidd-core
// ============================================================================

use aidd_core::GateResult;

use crate::context::GateContext;

/// A single readiness check run before a stage entrypoint is launched.
pub trait Gate: Send + Sync {
    /// The gate's stable name, used in [`GateResult::gate`] and logs.
    fn name(&self) -> &'static str;

    /// Evaluates this gate against `ctx`.
    fn run(&self, ctx: &GateContext) -> GateResult;
}

/// A gate built from a plain function, for the common case where a gate
/// needs no state beyond its name.
pub struct FnGate {
    /// The gate's stable name.
    name: &'static str,
    /// The evaluation function.
    func: fn(&GateContext) -> GateResult,
}

impl FnGate {
    /// Builds a gate named `name` that evaluates via `func`.
    #[must_use]
    pub const fn new(name: &'static str, func: fn(&GateContext) -> GateResult) -> Self {
        Self { name, func }
    }
}

impl Gate for FnGate {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, ctx: &GateContext) -> GateResult {
        (self.func)(ctx)
    }
}
