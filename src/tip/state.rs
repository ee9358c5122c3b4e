//! Tip State Definitions
//!
//! States a single tip passes through inside the orchestrator. They are not
//! persisted; they label log lines so one transfer can be followed end to end.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TipState {
    /// Request handed to the orchestrator
    Received,

    /// Context, identities, amount and recipient checks
    Validating,

    /// Trying to take the transfer gate
    Acquiring,

    /// Gate held, reading the sender's balance
    CheckingBalance,

    /// Gate held, building/signing/broadcasting
    Submitting,

    /// Gate held, handle known, waiting for finality
    AwaitingConfirmation,

    /// Terminal: nothing moved (or the ledger finally refused)
    Rejected,

    /// Terminal: acknowledged, confirmation not awaited
    Submitted,

    /// Terminal: finalized successfully
    Confirmed,

    /// Terminal: handle may exist, final status unknown
    Ambiguous,
}

impl TipState {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TipState::Rejected | TipState::Submitted | TipState::Confirmed | TipState::Ambiguous
        )
    }

    /// Check if the transfer gate is held in this state
    #[inline]
    pub fn holds_gate(&self) -> bool {
        matches!(
            self,
            TipState::CheckingBalance | TipState::Submitting | TipState::AwaitingConfirmation
        )
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            TipState::Received => "RECEIVED",
            TipState::Validating => "VALIDATING",
            TipState::Acquiring => "ACQUIRING",
            TipState::CheckingBalance => "CHECKING_BALANCE",
            TipState::Submitting => "SUBMITTING",
            TipState::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            TipState::Rejected => "REJECTED",
            TipState::Submitted => "SUBMITTED",
            TipState::Confirmed => "CONFIRMED",
            TipState::Ambiguous => "AMBIGUOUS",
        }
    }
}

impl fmt::Display for TipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
