use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::{RateLimitConfig, WindowLimiter};

/// Several quota windows enforced together.
///
/// A call is admitted only when every window admits it. Windows are
/// checked in construction order on each attempt; there is no priority
/// between them and no FIFO fairness between callers. Whichever waiter
/// the underlying semaphore wakes first goes first.
#[derive(Debug, Clone)]
pub struct CompositeLimiter {
    windows: Arc<Vec<WindowLimiter>>,
}

impl CompositeLimiter {
    /// Combine `windows` into one limiter. The list is fixed for the
    /// limiter's lifetime.
    #[must_use]
    pub fn new(windows: Vec<WindowLimiter>) -> Self {
        Self {
            windows: Arc::new(windows),
        }
    }

    /// Build the window list from a [`RateLimitConfig`].
    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config
                .windows
                .iter()
                .map(|spec| WindowLimiter::from(*spec))
                .collect(),
        )
    }

    /// Wait until every window admits the call.
    ///
    /// The returned [`Admission`] runs the post-call accounting on every
    /// window when dropped, whether the governed operation succeeded or
    /// not. The server counts a failed request against the quota all
    /// the same, so this layer must too.
    pub async fn wait(&self) -> Admission {
        for window in self.windows.iter() {
            window.acquire().await;
        }
        Admission {
            windows: Arc::clone(&self.windows),
        }
    }

    /// Run `op` under admission. Accounting is guaranteed, also on
    /// error or panic inside `op`.
    pub async fn execute<F, Fut, T>(&self, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _admission = self.wait().await;
        op().await
    }

    /// Empty every window until `after` has elapsed.
    ///
    /// Forwarded to each window; used when the server supplies an
    /// explicit retry delay.
    pub fn reset_in(&self, after: Duration) {
        for window in self.windows.iter() {
            window.reset_in(after);
        }
    }

    /// The windows in admission order.
    #[must_use]
    pub fn windows(&self) -> &[WindowLimiter] {
        &self.windows
    }
}

impl Default for CompositeLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

/// Token for one admitted call. Dropping it accounts the completed call
/// on every window of the limiter that granted it.
#[derive(Debug)]
pub struct Admission {
    windows: Arc<Vec<WindowLimiter>>,
}

impl Drop for Admission {
    fn drop(&mut self) {
        for window in self.windows.iter() {
            window.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorKind, Result};
    use tokio::time::timeout;

    const BLOCKED: Duration = Duration::from_millis(100);

    fn burst_and_sustained(burst: u32, sustained: u32) -> CompositeLimiter {
        CompositeLimiter::new(vec![
            WindowLimiter::new(burst, Duration::from_secs(1)),
            WindowLimiter::new(sustained, Duration::from_secs(120)),
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn test_admission_requires_every_window() {
        let limiter = burst_and_sustained(1, 100);

        let admission = limiter.wait().await;
        // The sustained window has plenty of room, but the burst window
        // is full; the composite must refuse.
        assert!(timeout(BLOCKED, limiter.wait()).await.is_err());
        drop(admission);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accounting_reaches_every_window() {
        let limiter = burst_and_sustained(5, 10);

        let admission = limiter.wait().await;
        for window in limiter.windows() {
            assert_eq!(window.in_flight(), 1);
        }

        drop(admission);
        for window in limiter.windows() {
            assert_eq!(window.in_flight(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_operation_still_consumes_quota() {
        let limiter = burst_and_sustained(5, 10);

        let outcome: Result<()> = limiter
            .execute(|| async {
                Err(ErrorKind::MissingApiKey)
            })
            .await;
        assert!(outcome.is_err());

        for window in limiter.windows() {
            assert_eq!(window.in_flight(), 0);
            assert_eq!(
                window.available_permits(),
                window.capacity() as usize - 1
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_admission_resumes_after_reset() {
        let limiter = burst_and_sustained(1, 100);
        let first = limiter.wait().await;
        drop(first); // arms the burst window's epoch timer

        let start = tokio::time::Instant::now();
        let _second = limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_limiter_carries_two_windows() {
        let limiter = CompositeLimiter::default();
        assert_eq!(limiter.windows().len(), 2);
    }
}
