//! Transfer Gate
//!
//! Single-slot, non-blocking exclusion: at most one tip is between balance
//! re-check and confirmation at any time. Callers never queue for it; a busy
//! gate is reported back to the user.
//!
//! The slot is released when the [`GatePermit`] drops, so every exit path
//! (return, `?`, panic unwind) frees it. The permit owns its slot and can be
//! moved into a spawned task, which is how the orchestrator keeps it held
//! until a submitted transfer is classified even if the requester goes away.
//!
//! # Known weakness
//! The gate lives in process memory. If the process dies while a permit is
//! out, nothing records that a transfer was in flight; after a restart the gate
//! is free again but the transaction may still land. Conversely, a permit that
//! is leaked without being dropped (see tests) blocks every later tip until
//! restart.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

pub struct TransferGate {
    slot: Arc<Semaphore>,
}

/// Proof of holding the gate
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Release explicitly; dropping the permit has the same effect
    pub fn release(self) {}
}

impl TransferGate {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the gate if free, without waiting
    pub fn try_acquire(&self) -> Option<GatePermit> {
        match self.slot.clone().try_acquire_owned() {
            Ok(permit) => {
                trace!("Transfer gate acquired");
                Some(GatePermit { _permit: permit })
            }
            Err(_) => None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.slot.available_permits() == 0
    }
}

impl Default for TransferGate {
    fn default() -> Self {
        Self::new()
    }
}
