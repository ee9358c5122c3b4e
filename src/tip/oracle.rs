//! Balance Oracle
//!
//! Read-only, rate-limited balance lookups. A failed read is an error, never
//! a zero balance.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::core_types::{AccountId, Amount};
use crate::ledger::{Ledger, LedgerError};
use crate::rate_limiter::RateLimiter;

pub struct BalanceOracle {
    ledger: Arc<dyn Ledger>,
    limiter: Arc<RateLimiter>,
}

impl BalanceOracle {
    pub fn new(ledger: Arc<dyn Ledger>, limiter: Arc<RateLimiter>) -> Self {
        Self { ledger, limiter }
    }

    pub async fn get_balance(&self, account: AccountId) -> Result<Amount, LedgerError> {
        let result = self
            .limiter
            .schedule(self.ledger.read_balance(account))
            .await;
        match &result {
            Ok(balance) => debug!(account, balance, ledger = self.ledger.name(), "Balance read"),
            Err(e) => warn!(account, error = %e, ledger = self.ledger.name(), "Balance read failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MockLedger;
    use std::time::Duration;

    #[tokio::test]
    async fn test_reads_through_ledger() {
        let ledger = Arc::new(MockLedger::new().with_balance(42, 1_000));
        let oracle = BalanceOracle::new(
            ledger.clone(),
            Arc::new(RateLimiter::new(Duration::from_millis(1))),
        );

        assert_eq!(oracle.get_balance(42).await.unwrap(), 1_000);
        assert_eq!(oracle.get_balance(7).await.unwrap(), 0);
        assert_eq!(ledger.balance_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_zero() {
        let ledger = Arc::new(MockLedger::new().with_balance(42, 1_000));
        ledger.set_fail_balance(Some(LedgerError::Transport("reset".into())));
        let oracle = BalanceOracle::new(
            ledger,
            Arc::new(RateLimiter::new(Duration::from_millis(1))),
        );

        assert!(oracle.get_balance(42).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_are_spaced() {
        let ledger = Arc::new(MockLedger::new());
        let oracle = BalanceOracle::new(
            ledger,
            Arc::new(RateLimiter::new(Duration::from_millis(1000))),
        );

        let begin = tokio::time::Instant::now();
        let _ = tokio::join!(oracle.get_balance(1), oracle.get_balance(2));
        assert!(tokio::time::Instant::now() - begin >= Duration::from_millis(1000));
    }
}
