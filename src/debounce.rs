//! Debounced propagation of a rapidly changing value.
//!
//! Each [`Debouncer::push`] replaces the pending value and restarts the timer;
//! [`Debouncer::settled`] resolves once the latest value has been stable for the
//! configured delay. Intermediate values are never queued.

use std::future;
use tokio::time::{sleep_until, Duration, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending value and restarts the timer.
    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.delay));
    }

    /// Drops the pending value; nothing will be propagated for it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Waits until the pending value has been stable for the delay and takes it.
    /// Pends forever while nothing is pending.
    ///
    /// Cancel-safe: dropping the future before it resolves keeps the pending
    /// value and its deadline, so it can be used as a `tokio::select!` branch.
    pub async fn settled(&mut self) -> T {
        let deadline = match &self.pending {
            Some((_, deadline)) => *deadline,
            None => return future::pending().await,
        };
        sleep_until(deadline).await;
        match self.pending.take() {
            Some((value, _)) => value,
            None => future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    const DELAY: Duration = Duration::from_millis(400);

    #[tokio::test(start_paused = true)]
    async fn rapid_updates_yield_only_the_last_value() {
        let mut debouncer = Debouncer::new(DELAY);
        for partial in ["r", "re", "rea", "reac", "react"] {
            debouncer.push(partial.to_string());
            advance(Duration::from_millis(100)).await;
        }

        assert_eq!(debouncer.settled().await, "react");
        assert!(!debouncer.is_pending());
        assert!(timeout(DELAY * 3, debouncer.settled()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn updates_separated_by_the_delay_yield_both_values() {
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push(1);
        assert_eq!(debouncer.settled().await, 1);

        advance(DELAY).await;
        debouncer.push(2);
        assert_eq!(debouncer.settled().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn new_value_restarts_the_timer() {
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push("a");
        advance(Duration::from_millis(300)).await;
        debouncer.push("b");

        let start = Instant::now();
        assert_eq!(debouncer.settled().await, "b");
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending_value() {
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push("late");
        debouncer.cancel();
        assert!(timeout(DELAY * 2, debouncer.settled()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_wait_keeps_pending_value() {
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push("kept");
        assert!(timeout(Duration::from_millis(100), debouncer.settled()).await.is_err());
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.settled().await, "kept");
    }
}
