// # Rate Budget
//
// Shared outbound-call limiter for the discoverer and the reconciler.
//
// Calls are paced without slack: a budget of N calls per period hands out
// start slots spaced `period / N` apart, so no window of one period ever
// contains more than N starts, even right after an idle stretch.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{Error, Result};

/// Thread-safe pacing limiter
///
/// Constructed once by the manager and shared through an `Arc`. The only
/// way to mutate it is [`RateBudget::take`].
#[derive(Debug)]
pub struct RateBudget {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateBudget {
    /// Create a budget of `calls` call starts per `per`
    pub fn new(calls: u32, per: Duration) -> Result<Self> {
        if calls == 0 {
            return Err(Error::config("Rate budget must allow at least one call"));
        }
        if per.is_zero() {
            return Err(Error::config("Rate budget period must be > 0"));
        }

        // Round up so that `calls` intervals never fit inside one period.
        let nanos = per.as_nanos().div_ceil(u128::from(calls));
        let interval = Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX));

        Ok(Self {
            interval,
            next_slot: Mutex::new(None),
        })
    }

    /// Create a budget of `calls` call starts per second
    pub fn per_second(calls: u32) -> Result<Self> {
        Self::new(calls, Duration::from_secs(1))
    }

    /// Minimum spacing between two call starts
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Take one token, waiting for the next free slot
    ///
    /// Returns the instant the caller was allowed to start.
    pub async fn take(&self) -> Instant {
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);
            slot
        };

        tokio::time::sleep_until(slot).await;
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_budget() {
        assert!(RateBudget::new(0, Duration::from_secs(1)).is_err());
        assert!(RateBudget::new(4, Duration::ZERO).is_err());
    }

    #[test]
    fn test_interval_rounds_up() {
        let budget = RateBudget::new(3, Duration::from_secs(1)).unwrap();
        assert_eq!(budget.interval(), Duration::from_nanos(333_333_334));

        let budget = RateBudget::per_second(4).unwrap();
        assert_eq!(budget.interval(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_take_is_immediate() {
        let budget = RateBudget::per_second(4).unwrap();
        let start = Instant::now();

        let slot = budget.take().await;
        assert_eq!(slot, start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_takes_are_paced() {
        let budget = RateBudget::per_second(4).unwrap();
        let start = Instant::now();

        for i in 0..5u32 {
            let slot = budget.take().await;
            assert_eq!(slot - start, Duration::from_millis(250) * i);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_budget_does_not_burst() {
        let budget = RateBudget::per_second(2).unwrap();
        budget.take().await;

        tokio::time::sleep(Duration::from_secs(10)).await;

        let first = budget.take().await;
        let second = budget.take().await;
        assert_eq!(second - first, Duration::from_millis(500));
    }
}
