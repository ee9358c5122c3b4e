//! Outcome Reporter
//!
//! Turns outcomes into the short messages posted back to the chat.
//! Ambiguous outcomes always carry the handle and never suggest a blind retry.

use crate::config::TokenConfig;
use crate::core_types::{AccountId, Amount};
use crate::money::{MoneyError, format_amount, format_amount_truncated};

use super::error::TipError;
use super::types::{TransferOutcome, TransferRequest};

pub struct OutcomeReporter {
    token: TokenConfig,
}

impl OutcomeReporter {
    pub fn new(token: TokenConfig) -> Self {
        Self { token }
    }

    fn amount(&self, value: Amount) -> String {
        let text = match self.token.display_decimals {
            Some(d) => format_amount_truncated(value, self.token.decimals, d),
            None => format_amount(value, self.token.decimals),
        };
        format!("{} {}", text, self.token.symbol)
    }

    /// Announcement posted while a tip is being processed
    pub fn render_pending(&self, request: &TransferRequest) -> String {
        format!(
            "Tipping {} {} to {}...",
            request.amount_text.trim(),
            self.token.symbol,
            display_name(request.context.recipient_name.as_deref(), request.context.recipient)
        )
    }

    pub fn render_outcome(&self, request: &TransferRequest, outcome: &TransferOutcome) -> String {
        let ctx = &request.context;
        let sender = display_name(ctx.sender_name.as_deref(), ctx.sender);
        let recipient = display_name(ctx.recipient_name.as_deref(), ctx.recipient);

        match outcome {
            TransferOutcome::Confirmed { tx, amount } => format!(
                "{} tipped {} to {}. tx: {}",
                sender,
                self.amount(*amount),
                recipient,
                tx
            ),
            TransferOutcome::Submitted { tx, amount } => format!(
                "{} is tipping {} to {}. Submitted, not yet confirmed. tx: {}",
                sender,
                self.amount(*amount),
                recipient,
                tx
            ),
            TransferOutcome::Ambiguous { tx: Some(tx), .. } => format!(
                "Transfer status unknown. Check tx {} before trying again.",
                tx
            ),
            TransferOutcome::Ambiguous { tx: None, .. } => {
                "Transfer status unknown. Check your balance before trying again.".to_string()
            }
            TransferOutcome::Rejected(err) => self.render_error(err),
        }
    }

    pub fn render_balance(&self, result: &Result<Amount, TipError>) -> String {
        match result {
            Ok(balance) => format!("You have {}", self.amount(*balance)),
            Err(TipError::UnknownSender) => "Could not determine your account.".to_string(),
            Err(_) => "Error fetching balance. Please try again later.".to_string(),
        }
    }

    fn render_error(&self, err: &TipError) -> String {
        match err {
            TipError::PrivateChat => "This command can only be used in groups.".to_string(),
            TipError::UnknownSender => "Could not determine your account.".to_string(),
            TipError::UnknownRecipient => {
                "Usage: Reply to a message with /tip <amount>".to_string()
            }
            TipError::InvalidAmount(MoneyError::InvalidAmount) => {
                "Amount must be greater than zero.".to_string()
            }
            TipError::InvalidAmount(MoneyError::PrecisionOverflow { max: 0, .. }) => {
                format!("Amount must be a whole number of {}.", self.token.symbol)
            }
            TipError::InvalidAmount(MoneyError::PrecisionOverflow { max, .. }) => {
                format!("Amount can have at most {} decimal places.", max)
            }
            TipError::InvalidAmount(MoneyError::Overflow) => "Amount is too large.".to_string(),
            TipError::InvalidAmount(MoneyError::InvalidFormat(_)) => {
                "Usage: Reply to a message with /tip <amount>".to_string()
            }
            TipError::SelfTip => "You cannot tip yourself.".to_string(),
            TipError::ProtectedRecipient(_) => "You cannot tip the bot.".to_string(),
            TipError::InsufficientBalance { balance, .. } => {
                format!("Insufficient balance, you have {}", self.amount(*balance))
            }
            TipError::Busy => "A transfer is pending. Try later.".to_string(),
            TipError::BalanceQuery(_) => "Error fetching balance. Please try again later.".to_string(),
            TipError::SubmitFailed(_) => "Transfer failed. Please try again later.".to_string(),
            TipError::Reverted(tx) => {
                format!("Transfer was rejected by the ledger, nothing moved. tx: {}", tx)
            }
        }
    }
}

fn display_name(name: Option<&str>, account: Option<AccountId>) -> String {
    match (name, account) {
        (Some(name), _) => name.to_string(),
        (None, Some(id)) => format!("user {}", id),
        (None, None) => "someone".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::TxHandle;
    use crate::ledger::LedgerError;
    use crate::tip::types::RequestContext;
    use std::time::Duration;

    const ONE: Amount = 1_000_000_000_000_000_000;

    fn reporter() -> OutcomeReporter {
        OutcomeReporter::new(TokenConfig::default())
    }

    fn request() -> TransferRequest {
        TransferRequest::new(
            RequestContext::group(-100, 1, 2).with_names("Alice", "Bob"),
            "3",
        )
    }

    #[test]
    fn test_confirmed_message() {
        let tx = TxHandle::new([0xab; 32]);
        let msg = reporter().render_outcome(
            &request(),
            &TransferOutcome::Confirmed {
                tx,
                amount: 3 * ONE,
            },
        );
        assert_eq!(msg, format!("Alice tipped 3 SPXP to Bob. tx: {}", tx));
    }

    #[test]
    fn test_pending_message() {
        assert_eq!(reporter().render_pending(&request()), "Tipping 3 SPXP to Bob...");
    }

    #[test]
    fn test_ambiguous_carries_handle() {
        let tx = TxHandle::new([0x11; 32]);
        let msg = reporter().render_outcome(
            &request(),
            &TransferOutcome::Ambiguous {
                tx: Some(tx),
                reason: LedgerError::Timeout(Duration::from_secs(120)),
            },
        );
        assert!(msg.contains(&tx.to_string()));
        assert!(!msg.contains("try again later"));
    }

    #[test]
    fn test_rejections() {
        let r = reporter();
        let req = request();
        let render = |e: TipError| r.render_outcome(&req, &TransferOutcome::Rejected(e));

        assert_eq!(render(TipError::Busy), "A transfer is pending. Try later.");
        assert_eq!(render(TipError::SelfTip), "You cannot tip yourself.");
        assert_eq!(
            render(TipError::InsufficientBalance {
                balance: 5 * ONE / 2,
                requested: 3 * ONE
            }),
            "Insufficient balance, you have 2.5 SPXP"
        );
        assert_eq!(
            render(TipError::InvalidAmount(MoneyError::PrecisionOverflow {
                provided: 1,
                max: 0
            })),
            "Amount must be a whole number of SPXP."
        );
        assert_eq!(
            render(TipError::PrivateChat),
            "This command can only be used in groups."
        );
    }

    #[test]
    fn test_balance_messages() {
        let r = reporter();
        assert_eq!(r.render_balance(&Ok(5 * ONE)), "You have 5 SPXP");
        assert_eq!(
            r.render_balance(&Err(TipError::BalanceQuery(LedgerError::Transport(
                "reset".into()
            )))),
            "Error fetching balance. Please try again later."
        );
    }

    #[test]
    fn test_display_decimals_truncate() {
        let r = OutcomeReporter::new(TokenConfig {
            display_decimals: Some(2),
            ..TokenConfig::default()
        });
        assert_eq!(r.render_balance(&Ok(1_239_000_000_000_000_000)), "You have 1.23 SPXP");
    }

    #[test]
    fn test_unnamed_parties() {
        let req = TransferRequest::new(RequestContext::group(-100, 1, 2), "1");
        let msg = reporter().render_outcome(
            &req,
            &TransferOutcome::Confirmed {
                tx: TxHandle::new([0; 32]),
                amount: ONE,
            },
        );
        assert!(msg.starts_with("user 1 tipped 1 SPXP to user 2."));
    }
}
