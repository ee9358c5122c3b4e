//! tipbot - On-chain tip transfers for chat communities
//!
//! Moves a community token between members' ledger accounts on request.
//! Every tip is validated, serialized through a single transfer gate,
//! checked against the live balance and submitted to an EVM contract.
//!
//! # Modules
//!
//! - [`core_types`] - AccountId, Amount, TxHandle
//! - [`money`] - Strict amount parsing and display formatting
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup
//! - [`rate_limiter`] - Spacing of outbound ledger calls
//! - [`ledger`] - Ledger port, EVM JSON-RPC adapter, transaction signing
//! - [`tip`] - Validation, transfer gate, orchestration and reporting

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod logging;
pub mod money;
pub mod rate_limiter;

pub mod ledger;
pub mod tip;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use core_types::{AccountId, Amount, RequestId, TxHandle};
pub use ledger::{EthLedger, Ledger, LedgerError, TxSigner};
pub use rate_limiter::RateLimiter;
pub use tip::{
    ChatKind, OutcomeReporter, RequestContext, TipError, TipOrchestrator, TransferOutcome,
    TransferRequest,
};
