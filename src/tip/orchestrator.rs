//! Tip Orchestrator
//!
//! Drives one tip from request to terminal outcome:
//!
//! 1. validate context, identities, amount and recipient (no I/O, no gate)
//! 2. take the transfer gate, or reject as busy
//! 3. re-read the sender's balance under the gate
//! 4. submit, then optionally wait for confirmation under a hard timeout
//! 5. release the gate on every path
//!
//! Steps 3-5 run in their own task that owns the gate permit. A caller that
//! stops waiting (dropped future, aborted task) cannot cut a submitted
//! transfer short: it still runs to a classified outcome and only then frees
//! the gate.
//!
//! Every ledger operation goes through the shared [`RateLimiter`].

use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::{TokenConfig, TransferConfig};
use crate::core_types::{AccountId, Amount, TxHandle};
use crate::ledger::{Ledger, LedgerError, SubmitError};
use crate::money::parse_amount;
use crate::rate_limiter::RateLimiter;

use super::error::TipError;
use super::gate::TransferGate;
use super::oracle::BalanceOracle;
use super::state::TipState;
use super::types::{RequestContext, TransferOutcome, TransferRequest};

/// A request that passed every local check
#[derive(Debug, Clone, Copy)]
struct ValidatedTip {
    from: AccountId,
    to: AccountId,
    amount: Amount,
}

/// The gate-held part of a tip, shared with the task that runs it
struct TransferWorker {
    ledger: Arc<dyn Ledger>,
    limiter: Arc<RateLimiter>,
    oracle: BalanceOracle,
    config: TransferConfig,
}

pub struct TipOrchestrator {
    worker: Arc<TransferWorker>,
    gate: TransferGate,
    config: TransferConfig,
    token: TokenConfig,
}

impl TipOrchestrator {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        limiter: Arc<RateLimiter>,
        config: TransferConfig,
        token: TokenConfig,
    ) -> Self {
        let worker = TransferWorker {
            oracle: BalanceOracle::new(ledger.clone(), limiter.clone()),
            ledger,
            limiter,
            config: config.clone(),
        };
        Self {
            worker: Arc::new(worker),
            gate: TransferGate::new(),
            config,
            token,
        }
    }

    pub fn token(&self) -> &TokenConfig {
        &self.token
    }

    /// True while some tip holds the gate
    pub fn is_busy(&self) -> bool {
        self.gate.is_held()
    }

    /// Run one tip to its terminal outcome. Never panics on ledger failures.
    ///
    /// Once the gate is taken the transfer is driven by a spawned task; the
    /// gate stays held until that task has classified the outcome, whether or
    /// not this future is still being polled.
    pub async fn submit_transfer(&self, request: &TransferRequest) -> TransferOutcome {
        let span = info_span!("tip", request_id = %request.id, chat_id = request.context.chat_id);
        async move {
            debug!(state = %TipState::Received, amount = %request.amount_text, "Tip received");
            let outcome = self.process(request).await;
            match &outcome {
                TransferOutcome::Rejected(e) => {
                    info!(state = %outcome.state(), code = e.code(), "Tip rejected: {}", e)
                }
                TransferOutcome::Submitted { tx, amount } => {
                    info!(state = %outcome.state(), tx = %tx, amount, "Tip submitted")
                }
                TransferOutcome::Confirmed { tx, amount } => {
                    info!(state = %outcome.state(), tx = %tx, amount, "Tip confirmed")
                }
                TransferOutcome::Ambiguous { tx, reason } => {
                    error!(
                        state = %outcome.state(),
                        tx = ?tx.map(|t| t.to_string()),
                        reason = %reason,
                        "Tip outcome unknown; verify by handle before any retry"
                    )
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Balance of the requester's own account
    pub async fn query_balance(&self, context: &RequestContext) -> Result<Amount, TipError> {
        let account = context.sender.ok_or(TipError::UnknownSender)?;
        self.worker
            .oracle
            .get_balance(account)
            .await
            .map_err(TipError::BalanceQuery)
    }

    async fn process(&self, request: &TransferRequest) -> TransferOutcome {
        debug!(state = %TipState::Validating);
        let tip = match self.validate(request) {
            Ok(tip) => tip,
            Err(e) => return TransferOutcome::Rejected(e),
        };

        debug!(state = %TipState::Acquiring);
        let Some(permit) = self.gate.try_acquire() else {
            return TransferOutcome::Rejected(TipError::Busy);
        };

        let worker = self.worker.clone();
        let task = tokio::spawn(
            async move {
                let outcome = worker.run(tip).await;
                permit.release();
                outcome
            }
            .in_current_span(),
        );

        match task.await {
            Ok(outcome) => outcome,
            // Panicked mid-transfer: whether anything was sent is unknown
            Err(e) => TransferOutcome::Ambiguous {
                tx: None,
                reason: LedgerError::Interrupted(format!("transfer task failed: {}", e)),
            },
        }
    }

    /// Local checks, cheapest first. No ledger access and no gate.
    fn validate(&self, request: &TransferRequest) -> Result<ValidatedTip, TipError> {
        let ctx = &request.context;
        if !ctx.chat_kind.permits_tips() {
            return Err(TipError::PrivateChat);
        }

        let from = ctx.sender.ok_or(TipError::UnknownSender)?;
        let to = ctx.recipient.ok_or(TipError::UnknownRecipient)?;

        let amount = parse_amount(
            &request.amount_text,
            self.token.decimals,
            self.config.max_fraction_digits,
        )?;

        if from == to {
            return Err(TipError::SelfTip);
        }
        if self.config.is_protected(to) {
            return Err(TipError::ProtectedRecipient(to));
        }

        Ok(ValidatedTip { from, to, amount })
    }
}

impl TransferWorker {
    /// Everything that must happen while the gate is held
    async fn run(&self, tip: ValidatedTip) -> TransferOutcome {
        debug!(state = %TipState::CheckingBalance, account = tip.from);
        let balance = match self.oracle.get_balance(tip.from).await {
            Ok(b) => b,
            Err(e) => return TransferOutcome::Rejected(TipError::BalanceQuery(e)),
        };
        if balance < tip.amount {
            return TransferOutcome::Rejected(TipError::InsufficientBalance {
                balance,
                requested: tip.amount,
            });
        }

        debug!(state = %TipState::Submitting, from = tip.from, to = tip.to, amount = tip.amount);
        let submitted = self
            .limiter
            .schedule(self.ledger.submit_transfer(tip.from, tip.to, tip.amount))
            .await;
        let tx = match submitted {
            Ok(tx) => tx,
            Err(SubmitError::NotSent(e)) => {
                return TransferOutcome::Rejected(TipError::SubmitFailed(e));
            }
            Err(SubmitError::Unknown { tx, source }) => {
                return TransferOutcome::Ambiguous { tx, reason: source };
            }
        };

        if !self.config.await_confirmation {
            return TransferOutcome::Submitted {
                tx,
                amount: tip.amount,
            };
        }

        debug!(state = %TipState::AwaitingConfirmation, tx = %tx);
        self.confirm(tx, tip.amount).await
    }

    async fn confirm(&self, tx: TxHandle, amount: Amount) -> TransferOutcome {
        let timeout = self.config.confirm_timeout();
        // The budget starts when the limiter dispatches, not while queued
        let waited = self
            .limiter
            .schedule(async {
                tokio::time::timeout(timeout, self.ledger.await_confirmation(&tx, timeout)).await
            })
            .await;

        match waited {
            Ok(Ok(receipt)) if receipt.success => TransferOutcome::Confirmed { tx, amount },
            Ok(Ok(receipt)) => {
                warn!(tx = %tx, block = receipt.block_number, "Transfer reverted");
                TransferOutcome::Rejected(TipError::Reverted(tx))
            }
            Ok(Err(e)) => TransferOutcome::Ambiguous {
                tx: Some(tx),
                reason: e,
            },
            Err(_) => TransferOutcome::Ambiguous {
                tx: Some(tx),
                reason: LedgerError::Timeout(timeout),
            },
        }
    }
}
