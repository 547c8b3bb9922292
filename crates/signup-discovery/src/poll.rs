//! Bounded polling.
//!
//! Every wait in the engine (finder, option reader, clickable wait, page
//! readiness, outcome detection) is a [`poll_until`] call with its own
//! [`PollPolicy`].

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Interval and total budget of a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between attempts
    pub interval: Duration,
    /// Total time allowed
    pub budget: Duration,
}

impl PollPolicy {
    /// Create a policy.
    #[must_use]
    pub fn new(interval: Duration, budget: Duration) -> Self {
        Self { interval, budget }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn once() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

/// Run `probe` until it yields a value or the budget is spent.
///
/// The probe always runs at least once, and once more when the budget is
/// reached. Returns `Ok(None)` on exhaustion; probe errors end the loop.
pub async fn poll_until<T, E, F, Fut>(policy: PollPolicy, mut probe: F) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.budget {
            return Ok(None);
        }
        sleep(policy.interval.min(policy.budget - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_value() {
        let attempts = Cell::new(0);
        let result: Result<Option<u32>, ()> = poll_until(
            PollPolicy::new(Duration::from_millis(80), Duration::from_secs(2)),
            || {
                attempts.set(attempts.get() + 1);
                let n = attempts.get();
                async move { Ok((n == 3).then_some(n)) }
            },
        )
        .await;

        assert_eq!(result, Ok(Some(3)));
        assert_eq!(attempts.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_budget() {
        let start = Instant::now();
        let attempts = Cell::new(0u32);
        let result: Result<Option<()>, ()> = poll_until(
            PollPolicy::new(Duration::from_millis(80), Duration::from_millis(200)),
            || {
                attempts.set(attempts.get() + 1);
                async { Ok(None) }
            },
        )
        .await;

        assert_eq!(result, Ok(None));
        // 0, 80, 160 and a final attempt at the 200ms boundary
        assert_eq!(attempts.get(), 4);
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(start.elapsed() < Duration::from_millis(280));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy() {
        let attempts = Cell::new(0u32);
        let result: Result<Option<()>, ()> = poll_until(PollPolicy::once(), || {
            attempts.set(attempts.get() + 1);
            async { Ok(None) }
        })
        .await;

        assert_eq!(result, Ok(None));
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_stops_loop() {
        let result: Result<Option<()>, &str> = poll_until(
            PollPolicy::new(Duration::from_millis(10), Duration::from_secs(1)),
            || async { Err("boom") },
        )
        .await;
        assert_eq!(result, Err("boom"));
    }
}
