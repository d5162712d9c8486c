use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;

use super::WindowSpec;

/// A single quota window admitting at most `capacity` calls per epoch.
///
/// Admission consumes a permit from a counting semaphore sized to the
/// capacity; permits come back only when the epoch resets. Epochs are
/// not fixed wall-clock ticks: the reset timer is armed by the first
/// completed call after an idle period, so no timer runs while the
/// window is idle and the epoch is measured from first completion, not
/// from a global clock.
///
/// A server-driven [`reset_in`](WindowLimiter::reset_in) supersedes any
/// pending epoch timer and empties the window until the given delay has
/// elapsed.
#[derive(Debug)]
pub struct WindowLimiter {
    capacity: u32,
    epoch: Duration,
    semaphore: Arc<Semaphore>,
    state: Arc<Mutex<WindowState>>,
}

/// Accounting guarded by one mutex so a completing call and a firing
/// timer cannot race.
#[derive(Debug)]
struct WindowState {
    /// Calls admitted and not yet finished
    in_flight: u32,
    /// Whether a reset task is scheduled for this epoch
    timer_armed: bool,
    /// Bumped to invalidate superseded reset tasks
    generation: u64,
}

impl WindowLimiter {
    /// Create a window admitting `capacity` calls per `epoch`.
    #[must_use]
    pub fn new(capacity: u32, epoch: Duration) -> Self {
        Self {
            capacity,
            epoch,
            semaphore: Arc::new(Semaphore::new(capacity as usize)),
            state: Arc::new(Mutex::new(WindowState {
                in_flight: 0,
                timer_armed: false,
                generation: 0,
            })),
        }
    }

    /// Admit one call, waiting for a free permit if the window is full.
    ///
    /// Waits indefinitely by default, matching the remote quota: there
    /// is nothing useful to do before the epoch turns over. Callers
    /// that need a deadline wrap the future in
    /// [`tokio::time::timeout`].
    ///
    /// # Panics
    ///
    /// Panics if the accounting mutex is poisoned.
    pub async fn acquire(&self) {
        let permit = self
            .semaphore
            .acquire()
            .await
            // SAFETY: this should not panic as we never close the semaphore
            .expect("Semaphore was closed unexpectedly");
        // The permit stays consumed for the rest of the epoch; only the
        // reset task hands it back.
        permit.forget();
        self.state.lock().unwrap().in_flight += 1;
    }

    /// Account for a finished call, successful or not, and arm the
    /// epoch reset if none is scheduled yet.
    ///
    /// # Panics
    ///
    /// Panics if the accounting mutex is poisoned.
    pub fn release(&self) {
        let mut state = self.state.lock().unwrap();
        state.in_flight = state.in_flight.saturating_sub(1);
        if !state.timer_armed {
            state.timer_armed = true;
            let generation = state.generation;
            drop(state);
            self.arm_reset(generation, self.epoch);
        }
    }

    /// Force the next reset to happen `after` from now.
    ///
    /// Used when the server answers with an explicit retry delay: any
    /// pending epoch timer is superseded, every available permit is
    /// drained, and a fresh reset is scheduled for `after`. No call is
    /// admitted in the meantime.
    ///
    /// # Panics
    ///
    /// Panics if the accounting mutex is poisoned.
    pub fn reset_in(&self, after: Duration) {
        let mut state = self.state.lock().unwrap();
        state.generation += 1;
        state.timer_armed = true;
        let generation = state.generation;
        drop(state);

        drain(&self.semaphore);
        log::debug!(
            "window emptied, next reset in {}ms",
            after.as_millis()
        );
        self.arm_reset(generation, after);
    }

    /// Schedule a one-shot reset task. A task whose generation has been
    /// superseded in the meantime does nothing when it fires.
    fn arm_reset(&self, generation: u64, after: Duration) {
        let semaphore = Arc::clone(&self.semaphore);
        let state = Arc::clone(&self.state);
        let capacity = self.capacity;
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            reset(&semaphore, &state, capacity, generation);
        });
    }

    /// Permits currently available for admission.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Calls admitted and not yet finished.
    ///
    /// # Panics
    ///
    /// Panics if the accounting mutex is poisoned.
    #[must_use]
    pub fn in_flight(&self) -> u32 {
        self.state.lock().unwrap().in_flight
    }

    /// Calls admitted per epoch.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }
}

impl From<WindowSpec> for WindowLimiter {
    fn from(spec: WindowSpec) -> Self {
        Self::new(spec.capacity, spec.epoch)
    }
}

/// Timer body: refill the window for the next epoch.
fn reset(semaphore: &Semaphore, state: &Mutex<WindowState>, capacity: u32, generation: u64) {
    let mut state = state.lock().unwrap();
    if state.generation != generation {
        // Superseded by a server-driven reset while we slept.
        return;
    }
    drain(semaphore);
    let refill = capacity.saturating_sub(state.in_flight);
    semaphore.add_permits(refill as usize);
    state.timer_armed = false;
    log::debug!(
        "window reset: {refill} permits restored, {} still in flight",
        state.in_flight
    );
}

/// Take every available permit out of circulation.
fn drain(semaphore: &Semaphore) {
    while let Ok(permit) = semaphore.try_acquire() {
        permit.forget();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use tokio::time::{timeout, Instant};

    const EPOCH: Duration = Duration::from_secs(1);

    /// A short wait that only elapses if the acquire cannot proceed.
    const BLOCKED: Duration = Duration::from_millis(100);

    #[tokio::test(start_paused = true)]
    async fn test_capacity_admits_immediately() {
        let limiter = WindowLimiter::new(3, EPOCH);
        let admissions: Vec<_> = (0..3).map(|_| limiter.acquire()).collect();
        join_all(admissions).await;

        assert_eq!(limiter.available_permits(), 0);
        assert_eq!(limiter.in_flight(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_over_capacity_blocks_until_epoch_reset() {
        let limiter = WindowLimiter::new(2, EPOCH);
        limiter.acquire().await;
        limiter.acquire().await;

        // The window is full; a third admission cannot proceed.
        assert!(timeout(BLOCKED, limiter.acquire()).await.is_err());

        // The first completion arms the epoch timer.
        limiter.release();
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= EPOCH - BLOCKED);
        assert_eq!(limiter.in_flight(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_refills_capacity_minus_in_flight() {
        let limiter = WindowLimiter::new(3, EPOCH);
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        // One call finishes, two stay in flight across the epoch turn.
        limiter.release();
        tokio::time::sleep(EPOCH + Duration::from_millis(10)).await;

        assert_eq!(limiter.available_permits(), 1);
        assert_eq!(limiter.in_flight(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_arms_at_most_one_timer_per_epoch() {
        let limiter = WindowLimiter::new(2, EPOCH);
        limiter.acquire().await;
        limiter.acquire().await;

        // Both completions land in the same epoch; only the first arms.
        limiter.release();
        limiter.release();
        tokio::time::sleep(EPOCH + Duration::from_millis(10)).await;

        assert_eq!(limiter.available_permits(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_in_empties_window_for_the_whole_delay() {
        let limiter = WindowLimiter::new(2, EPOCH);
        limiter.acquire().await;
        limiter.release();

        limiter.reset_in(Duration::from_secs(5));
        assert_eq!(limiter.available_permits(), 0);

        // The superseded 1s epoch timer must not refill early.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(limiter.available_permits(), 0);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(limiter.available_permits(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_after_reset_in_waits_out_the_delay() {
        let limiter = WindowLimiter::new(1, EPOCH);
        limiter.reset_in(Duration::from_secs(3));

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_timer_runs_while_idle() {
        let limiter = WindowLimiter::new(2, EPOCH);
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.release();
        limiter.release();

        // Long after the armed epoch fired, the window sits full and
        // quiet; admissions go straight through again.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(limiter.available_permits(), 2);
        limiter.acquire().await;
        assert_eq!(limiter.available_permits(), 1);
    }
}
