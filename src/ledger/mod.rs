//! Ledger Port
//!
//! The orchestrator talks to the system of record only through [`Ledger`].
//! The production adapter is [`EthLedger`] (EVM JSON-RPC); tests use
//! [`MockLedger`].

pub mod abi;
pub mod eth;
pub mod signer;

pub use eth::EthLedger;
pub use signer::TxSigner;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::core_types::{AccountId, Amount, TxHandle};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The request never reached the node
    #[error("RPC connection failed: {0}")]
    RpcConnection(String),

    /// The request may have reached the node but the exchange broke off
    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Chain mismatch: node reports chain {connected}, expected {expected}")]
    ChainMismatch { connected: u64, expected: u64 },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The task driving the operation stopped before reporting back
    #[error("Interrupted: {0}")]
    Interrupted(String),
}

/// Why a submission did not yield a usable handle
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Failed before anything left the process, or the node explicitly refused
    /// the transaction. Nothing was sent; safe to retry.
    #[error("Transaction not sent: {0}")]
    NotSent(LedgerError),

    /// The signed transaction may have reached the network but no
    /// acknowledgement came back. `tx` is the locally computed hash, if known.
    #[error("Broadcast outcome unknown: {source}")]
    Unknown {
        tx: Option<TxHandle>,
        source: LedgerError,
    },
}

/// Finalized transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub tx: TxHandle,
    pub block_number: u64,
    /// False when the transaction was mined but reverted
    pub success: bool,
}

/// Port trait for the tip ledger.
///
/// Callers rate-limit per method call. An implementation may issue several
/// requests to its backend inside one call.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Ledger name for logging
    fn name(&self) -> &'static str;

    /// Current balance of `account`. Pure read.
    async fn read_balance(&self, account: AccountId) -> Result<Amount, LedgerError>;

    /// Build, sign and broadcast a transfer. Returns on acknowledgement,
    /// not on confirmation.
    async fn submit_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<TxHandle, SubmitError>;

    /// Wait until `tx` is finalized, giving up after `timeout`.
    async fn await_confirmation(
        &self,
        tx: &TxHandle,
        timeout: Duration,
    ) -> Result<Receipt, LedgerError>;
}


#[cfg(test)]
pub use mock::MockLedger;
