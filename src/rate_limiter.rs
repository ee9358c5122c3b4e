//! Outbound Rate Limiter
//!
//! Spaces the *start* of ledger operations (balance reads, submissions,
//! confirmation waits) at least `min_interval` apart, in arrival order.
//!
//! The unit is one [`Ledger`](crate::ledger::Ledger) call, not one RPC. A
//! submission covers its nonce, fee, gas and broadcast requests in a single
//! slot, and a confirmation wait covers all of its receipt polls (spaced by
//! the adapter's own poll interval).
//!
//! Only start spacing is limited: once an operation has been dispatched it
//! runs concurrently with whatever is dispatched after it. The queue is the
//! wait list of a `tokio::sync::Mutex`, which grants the lock in FIFO order,
//! so no request can overtake another.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

pub struct RateLimiter {
    min_interval: Duration,
    /// Start time of the most recently dispatched operation
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Run `op` once its slot comes up and return its result
    ///
    /// The outcome of `op` (including errors) has no effect on the queue.
    pub async fn schedule<F, T>(&self, op: F) -> T
    where
        F: Future<Output = T>,
    {
        self.wait_turn().await;
        op.await
    }

    async fn wait_turn(&self) {
        let mut last = self.last_start.lock().await;
        if let Some(prev) = *last {
            let slot = prev + self.min_interval;
            if slot > Instant::now() {
                trace!(
                    wait_ms = (slot - Instant::now()).as_millis() as u64,
                    "Rate limiter delaying dispatch"
                );
                tokio::time::sleep_until(slot).await;
            }
        }
        *last = Some(Instant::now());
        // Guard drops here: the operation itself runs outside the lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[tokio::test(start_paused = true)]
    async fn test_first_operation_runs_immediately() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        let begin = Instant::now();
        let value = limiter.schedule(async { 7 }).await;
        assert_eq!(value, 7);
        assert!(Instant::now() - begin < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_spaced_in_arrival_order() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        let starts = StdMutex::new(Vec::new());
        let begin = Instant::now();

        let op = |id: u32| {
            let starts = &starts;
            async move {
                starts.lock().unwrap().push((id, Instant::now() - begin));
            }
        };

        tokio::join!(
            limiter.schedule(op(1)),
            limiter.schedule(op(2)),
            limiter.schedule(op(3)),
        );

        let starts = starts.into_inner().unwrap();
        let ids: Vec<u32> = starts.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        for pair in starts.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(1000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_is_not_limited() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let begin = Instant::now();

        // A slow first operation must not hold back the second beyond spacing
        let slow = limiter.schedule(tokio::time::sleep(Duration::from_secs(10)));
        let fast = async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            limiter.schedule(async { Instant::now() - begin }).await
        };

        let ((), fast_start) = tokio::join!(slow, fast);
        assert!(fast_start < Duration::from_secs(1));
        assert!(fast_start >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_disturb_queue() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        let begin = Instant::now();

        let (first, second) = tokio::join!(
            limiter.schedule(async { Err::<(), &str>("rpc down") }),
            limiter.schedule(async { Ok::<Duration, &str>(Instant::now() - begin) }),
        );

        assert!(first.is_err());
        let second_start = second.unwrap();
        assert!(second_start >= Duration::from_millis(500));
        assert!(second_start < Duration::from_millis(600));
    }
}
