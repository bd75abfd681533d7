// crates/aidd-core/src/interfaces/mod.rs
// ============================================================================
// Module: Core Interfaces
// Description: Trait seams implemented by concrete backends elsewhere in the
//   workspace.
// Purpose: Let the dispatcher and loop runner depend on a storage contract
//   rather than a concrete file-backed implementation.
// Dependencies: aidd-core::core::active_state
// ============================================================================

//! ## Overview
//! Today there is exactly one implementation of [`ActiveStateStore`]
//! ([`crate::core::active_state::FileActiveStateStore`]), but the trait seam
//! keeps the dispatcher and loop runner from depending on file-system
//! details directly, matching the teacher crate's `RunStateStore` interface
//! pattern.

use crate::core::active_state::ActiveState;
use crate::core::active_state::ActiveStateError;

/// Storage contract for active workflow state.
pub trait ActiveStateStore: Send + Sync {
    /// Loads the workflow root's single active state document, if one has
    /// been persisted.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveStateError`] when the persisted state exists but
    /// cannot be read or parsed.
    fn load(&self) -> Result<Option<ActiveState>, ActiveStateError>;

    /// Atomically persists `state`.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveStateError`] when the state cannot be serialized or
    /// written.
    fn save(&self, state: &ActiveState) -> Result<(), ActiveStateError>;
}
