//! Time source used by every component that waits or compares timestamps.
//!
//! Token expiry, rate-limit windows, backoff and batch pacing all read the
//! time through [`Clock`], so tests can run them on virtual time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time as milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `chrono` and the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_past_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }

    #[tokio::test]
    async fn test_system_clock_sleep_zero_returns() {
        SystemClock.sleep(Duration::ZERO).await;
    }
}
