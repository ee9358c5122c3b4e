//! Peer-to-peer tipping
//!
//! One tip moves a fixed amount of the token from the requester's account to
//! the account of the user they replied to. Requests are validated locally,
//! serialized through a single-slot gate, re-checked against the live balance
//! and then submitted to the ledger.
//!
//! # State Flow
//!
//! ```text
//! RECEIVED -> VALIDATING --(bad request)------------------------> REJECTED
//!                 |
//!                 v
//!             ACQUIRING --(gate held)---------------------------> REJECTED (busy)
//!                 |
//!                 v
//!          CHECKING_BALANCE --(read failed / too low)-----------> REJECTED
//!                 |
//!                 v
//!             SUBMITTING --(not sent)---------------------------> REJECTED
//!                 |      --(sent, no ack)-----------------------> AMBIGUOUS
//!                 |      --(ack, confirmation not awaited)------> SUBMITTED
//!                 v
//!       AWAITING_CONFIRMATION --(success)-----------------------> CONFIRMED
//!                            --(reverted)-----------------------> REJECTED
//!                            --(timeout / error)----------------> AMBIGUOUS
//! ```
//!
//! The gate is held from CHECKING_BALANCE until a terminal state is reached.

pub mod error;
pub mod gate;
pub mod oracle;
pub mod orchestrator;
pub mod report;
pub mod state;
pub mod types;

pub use error::{ErrorKind, TipError};
pub use gate::{GatePermit, TransferGate};
pub use oracle::BalanceOracle;
pub use orchestrator::TipOrchestrator;
pub use report::OutcomeReporter;
pub use state::TipState;
pub use types::{ChatKind, RequestContext, TransferOutcome, TransferRequest};
