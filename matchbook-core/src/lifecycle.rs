//! Match lifecycle state machine.
//!
//! `Scheduled -> Open -> Frozen -> {Resolved, Voided}`, with early voiding
//! allowed from `Scheduled` and `Open`. Resolution requires `Frozen`:
//! betting must be explicitly closed before a winner can be declared.

use crate::error::{MatchbookError, Result};
use crate::types::MatchStatus;

/// Validate a transition without applying it. Terminal states reject
/// everything with `MatchAlreadyFinal`; other illegal moves with
/// `InvalidTransition`.
pub fn check_transition(from: MatchStatus, to: MatchStatus) -> Result<()> {
    if from.is_terminal() {
        return Err(MatchbookError::MatchAlreadyFinal { status: from });
    }

    let allowed = matches!(
        (from, to),
        (MatchStatus::Scheduled, MatchStatus::Open)
            | (MatchStatus::Open, MatchStatus::Frozen)
            | (MatchStatus::Frozen, MatchStatus::Resolved)
            | (MatchStatus::Scheduled, MatchStatus::Voided)
            | (MatchStatus::Open, MatchStatus::Voided)
            | (MatchStatus::Frozen, MatchStatus::Voided)
    );

    if !allowed {
        return Err(MatchbookError::InvalidTransition { from, to });
    }

    Ok(())
}
