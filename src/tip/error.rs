//! Tip Error Types
//!
//! Every failure on the tip path is converted into one of these at the
//! orchestrator boundary; none propagate further.

use thiserror::Error;

use crate::core_types::{AccountId, Amount, TxHandle};
use crate::ledger::LedgerError;
use crate::money::MoneyError;

/// Error taxonomy, used for reporting and retry advice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request: context, identities, amount, recipient, funds. No ledger write.
    Validation,
    /// Another transfer is in flight
    Busy,
    /// Balance read failed
    Query,
    /// Nothing was sent, or the ledger finally refused it
    Submit,
    /// A handle exists but the final status is unknown
    Confirm,
}

impl ErrorKind {
    /// Whether the requester may simply reissue the command
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorKind::Confirm)
    }
}

/// Tip rejection reasons
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TipError {
    // === Validation Errors ===
    #[error("Tips are only allowed in group chats")]
    PrivateChat,

    #[error("Could not determine the sender")]
    UnknownSender,

    #[error("Could not determine the recipient")]
    UnknownRecipient,

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    #[error("Source and target account cannot be the same")]
    SelfTip,

    #[error("Account {0} is protected and cannot receive tips")]
    ProtectedRecipient(AccountId),

    #[error("Insufficient balance: have {balance}, need {requested}")]
    InsufficientBalance { balance: Amount, requested: Amount },

    // === Concurrency ===
    #[error("A transfer is already pending")]
    Busy,

    // === Ledger Errors ===
    #[error("Balance query failed: {0}")]
    BalanceQuery(LedgerError),

    #[error("Transfer not sent: {0}")]
    SubmitFailed(LedgerError),

    #[error("Transfer {0} reverted on-chain")]
    Reverted(TxHandle),
}

impl TipError {
    /// Stable error code for logs and metrics labels
    pub fn code(&self) -> &'static str {
        match self {
            TipError::PrivateChat => "PRIVATE_CHAT",
            TipError::UnknownSender => "UNKNOWN_SENDER",
            TipError::UnknownRecipient => "UNKNOWN_RECIPIENT",
            TipError::InvalidAmount(_) => "INVALID_AMOUNT",
            TipError::SelfTip => "SELF_TIP",
            TipError::ProtectedRecipient(_) => "PROTECTED_RECIPIENT",
            TipError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            TipError::Busy => "BUSY",
            TipError::BalanceQuery(_) => "BALANCE_QUERY_FAILED",
            TipError::SubmitFailed(_) => "SUBMIT_FAILED",
            TipError::Reverted(_) => "REVERTED",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TipError::PrivateChat
            | TipError::UnknownSender
            | TipError::UnknownRecipient
            | TipError::InvalidAmount(_)
            | TipError::SelfTip
            | TipError::ProtectedRecipient(_)
            | TipError::InsufficientBalance { .. } => ErrorKind::Validation,
            TipError::Busy => ErrorKind::Busy,
            TipError::BalanceQuery(_) => ErrorKind::Query,
            TipError::SubmitFailed(_) | TipError::Reverted(_) => ErrorKind::Submit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TipError::SelfTip.code(), "SELF_TIP");
        assert_eq!(
            TipError::InsufficientBalance {
                balance: 1,
                requested: 2
            }
            .code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(TipError::Busy.code(), "BUSY");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            TipError::InvalidAmount(MoneyError::InvalidAmount).kind(),
            ErrorKind::Validation
        );
        assert_eq!(TipError::Busy.kind(), ErrorKind::Busy);
        assert_eq!(
            TipError::BalanceQuery(LedgerError::Transport("reset".into())).kind(),
            ErrorKind::Query
        );
        assert_eq!(
            TipError::SubmitFailed(LedgerError::Signing("bad key".into())).kind(),
            ErrorKind::Submit
        );
    }

    #[test]
    fn test_only_confirm_errors_block_retry() {
        assert!(ErrorKind::Validation.is_retryable());
        assert!(ErrorKind::Busy.is_retryable());
        assert!(ErrorKind::Query.is_retryable());
        assert!(ErrorKind::Submit.is_retryable());
        assert!(!ErrorKind::Confirm.is_retryable());
    }

    #[test]
    fn test_money_error_converts() {
        let err: TipError = MoneyError::Overflow.into();
        assert!(matches!(err, TipError::InvalidAmount(MoneyError::Overflow)));
    }
}
