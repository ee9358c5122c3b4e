//! Tip request and outcome types

use crate::core_types::{AccountId, Amount, RequestId, TxHandle};
use crate::ledger::LedgerError;

use super::error::{ErrorKind, TipError};
use super::state::TipState;

/// Kind of chat a command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    /// One-on-one chat with the bot
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    /// Peer-to-peer tips need an audience; one-on-one chats are excluded
    pub fn permits_tips(&self) -> bool {
        !matches!(self, ChatKind::Private)
    }
}

/// Identity information resolved by the chat layer
///
/// `sender` / `recipient` are `None` when the chat layer could not resolve
/// them (e.g. the tip was not a reply to someone's message).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub chat_kind: ChatKind,
    pub chat_id: i64,
    pub sender: Option<AccountId>,
    pub recipient: Option<AccountId>,
    pub sender_name: Option<String>,
    pub recipient_name: Option<String>,
}

impl RequestContext {
    /// Group-chat context with both parties resolved
    pub fn group(chat_id: i64, sender: AccountId, recipient: AccountId) -> Self {
        Self {
            chat_kind: ChatKind::Group,
            chat_id,
            sender: Some(sender),
            recipient: Some(recipient),
            sender_name: None,
            recipient_name: None,
        }
    }

    pub fn with_names(mut self, sender: impl Into<String>, recipient: impl Into<String>) -> Self {
        self.sender_name = Some(sender.into());
        self.recipient_name = Some(recipient.into());
        self
    }
}

/// A user-issued tip, consumed once by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub id: RequestId,
    pub context: RequestContext,
    /// The amount exactly as the user typed it; not yet validated
    pub amount_text: String,
}

impl TransferRequest {
    pub fn new(context: RequestContext, amount_text: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            context,
            amount_text: amount_text.into(),
        }
    }
}

/// Final result of one tip, produced exactly once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Nothing moved; the requester may retry
    Rejected(TipError),

    /// The ledger acknowledged the transaction; confirmation was not awaited
    Submitted { tx: TxHandle, amount: Amount },

    /// The transaction is final
    Confirmed { tx: TxHandle, amount: Amount },

    /// The transaction may or may not have landed. Must be verified by handle
    /// before any retry, or the tip could be paid twice.
    Ambiguous {
        tx: Option<TxHandle>,
        reason: LedgerError,
    },
}

impl TransferOutcome {
    /// Terminal state this outcome corresponds to
    pub fn state(&self) -> TipState {
        match self {
            TransferOutcome::Rejected(_) => TipState::Rejected,
            TransferOutcome::Submitted { .. } => TipState::Submitted,
            TransferOutcome::Confirmed { .. } => TipState::Confirmed,
            TransferOutcome::Ambiguous { .. } => TipState::Ambiguous,
        }
    }

    pub fn tx(&self) -> Option<&TxHandle> {
        match self {
            TransferOutcome::Submitted { tx, .. } | TransferOutcome::Confirmed { tx, .. } => {
                Some(tx)
            }
            TransferOutcome::Ambiguous { tx, .. } => tx.as_ref(),
            TransferOutcome::Rejected(TipError::Reverted(tx)) => Some(tx),
            TransferOutcome::Rejected(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            TransferOutcome::Rejected(e) => Some(e.kind()),
            TransferOutcome::Ambiguous { .. } => Some(ErrorKind::Confirm),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, TransferOutcome::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_chat_forbids_tips() {
        assert!(!ChatKind::Private.permits_tips());
        assert!(ChatKind::Group.permits_tips());
        assert!(ChatKind::Supergroup.permits_tips());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let ctx = RequestContext::group(-100, 1, 2);
        let a = TransferRequest::new(ctx.clone(), "3");
        let b = TransferRequest::new(ctx, "3");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_outcome_tx_and_kind() {
        let tx = TxHandle::new([1; 32]);

        let ambiguous = TransferOutcome::Ambiguous {
            tx: Some(tx),
            reason: LedgerError::Timeout(std::time::Duration::from_secs(1)),
        };
        assert_eq!(ambiguous.tx(), Some(&tx));
        assert_eq!(ambiguous.error_kind(), Some(ErrorKind::Confirm));
        assert_eq!(ambiguous.state(), TipState::Ambiguous);

        let confirmed = TransferOutcome::Confirmed { tx, amount: 5 };
        assert_eq!(confirmed.error_kind(), None);
        assert!(confirmed.state().is_terminal());

        let busy = TransferOutcome::Rejected(TipError::Busy);
        assert_eq!(busy.tx(), None);
        assert!(busy.is_rejected());
    }
}
