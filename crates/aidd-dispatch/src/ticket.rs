// crates/aidd-dispatch/src/ticket.rs
// ============================================================================
// Module: Effective Ticket Resolution
// Description: Resolves the ticket a dispatch invocation operates on.
// Purpose: Let an explicit `--ticket` flag win, falling back to whatever
//   ticket is already active for the resolved scope.
// Dependencies: aidd-core
// ============================================================================

use std::path::Path;

use aidd_core::ActiveState;
use aidd_core::Ticket;

use crate::error::DispatchError;

/// Resolves the effective ticket for a dispatch invocation.
///
/// `explicit` always wins when present. Otherwise the ticket recorded in
/// `active_state` is used.
///
/// # Errors
///
/// Returns [`DispatchError::MissingTicket`] when neither `explicit` nor
/// `active_state` supplies a ticket.
pub fn resolve_effective_ticket(
    explicit: Option<Ticket>,
    active_state: Option<&ActiveState>,
    workflow_root: &Path,
) -> Result<Ticket, DispatchError> {
    explicit
        .or_else(|| active_state.and_then(|state| state.ticket.clone()))
        .ok_or_else(|| DispatchError::MissingTicket(workflow_root.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::resolve_effective_ticket;
    use aidd_core::ActiveState;
    use aidd_core::Stage;
    use aidd_core::Ticket;
    use aidd_core::Timestamp;
    use std::path::PathBuf;

    fn state_with_ticket(ticket: &str) -> ActiveState {
        ActiveState {
            ticket: Some(Ticket::from(ticket)),
            stage: Some(Stage::Idea),
            updated_at: Some(Timestamp::parse("2026-07-28T00:00:00Z").expect("valid")),
            ..ActiveState::default()
        }
    }

    #[test]
    fn explicit_ticket_wins_over_active_state() {
        let state = state_with_ticket("AIDD-1");
        let resolved = resolve_effective_ticket(
            Some(Ticket::from("AIDD-2")),
            Some(&state),
            &PathBuf::from("/workspace"),
        )
        .expect("resolves");
        assert_eq!(resolved, Ticket::from("AIDD-2"));
    }

    #[test]
    fn falls_back_to_active_state_ticket() {
        let state = state_with_ticket("AIDD-1");
        let resolved = resolve_effective_ticket(None, Some(&state), &PathBuf::from("/workspace")).expect("resolves");
        assert_eq!(resolved, Ticket::from("AIDD-1"));
    }

    #[test]
    fn errors_when_no_ticket_is_available() {
        let result = resolve_effective_ticket(None, None, &PathBuf::from("/workspace"));
        assert!(result.is_err());
    }
}
