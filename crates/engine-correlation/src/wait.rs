//! Cancellable waiting and the polling backoff policy.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Wait schedule for the polling read loop.
///
/// Cycle `n` (starting at 0) waits `initial * (1 + n * growth)`, so deep
/// searches are polled less often while shallow ones still return quickly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub growth: f64,
}

/// Longest single wait of the schedule, whatever the cycle or growth.
pub const MAX_CYCLE_WAIT: Duration = Duration::from_secs(60);

impl Backoff {
    /// Negative or non-finite growth is treated as 0.
    pub fn new(initial: Duration, growth: f64) -> Self {
        let growth = if growth.is_finite() { growth.max(0.0) } else { 0.0 };
        Self { initial, growth }
    }

    /// Constant interval.
    pub fn fixed(interval: Duration) -> Self {
        Self::new(interval, 0.0)
    }

    /// Wait duration for the given cycle, capped at [`MAX_CYCLE_WAIT`].
    pub fn wait_for_cycle(&self, cycle: u32) -> Duration {
        let factor = 1.0 + f64::from(cycle) * self.growth;
        Duration::try_from_secs_f64(factor * self.initial.as_secs_f64())
            .map_or(MAX_CYCLE_WAIT, |wait| wait.min(MAX_CYCLE_WAIT))
    }
}

/// How a [`CancelToken::wait`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration passed.
    Elapsed,
    /// Woken before the duration passed without a cancellation, by
    /// [`CancelToken::interrupt`] or spuriously.
    Interrupted,
    /// The token was cancelled before or during the wait.
    Cancelled,
}

/// Timer plus cancellation signal shared between a waiting client and
/// whoever may want to abort it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the current and all future waits on this token.
    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    /// Wake the current wait early without cancelling it.
    ///
    /// The waiter sees [`WaitOutcome::Interrupted`] and goes on to read
    /// whatever output is already there. Has no effect when nobody waits.
    pub fn interrupt(&self) {
        let (lock, cvar) = &*self.inner;
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for `duration` unless cancelled or interrupted first.
    pub fn wait(&self, duration: Duration) -> WaitOutcome {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if *guard {
            return WaitOutcome::Cancelled;
        }
        let (guard, result) = cvar
            .wait_timeout(guard, duration)
            .unwrap_or_else(PoisonError::into_inner);
        if *guard {
            WaitOutcome::Cancelled
        } else if result.timed_out() {
            WaitOutcome::Elapsed
        } else {
            WaitOutcome::Interrupted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Instant;

    #[test]
    fn backoff_grows_linearly_from_initial() {
        let backoff = Backoff::new(Duration::from_millis(100), 0.5);
        assert_eq!(backoff.wait_for_cycle(0), Duration::from_millis(100));
        assert_eq!(backoff.wait_for_cycle(1), Duration::from_millis(150));
        assert_eq!(backoff.wait_for_cycle(4), Duration::from_millis(300));
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let backoff = Backoff::fixed(Duration::from_millis(10));
        assert_eq!(backoff.wait_for_cycle(0), backoff.wait_for_cycle(50));
    }

    #[test]
    fn negative_growth_is_clamped() {
        let backoff = Backoff::new(Duration::from_millis(10), -3.0);
        assert_eq!(backoff.growth, 0.0);
    }

    #[test]
    fn non_finite_growth_is_clamped() {
        assert_eq!(Backoff::new(Duration::from_millis(10), f64::NAN).growth, 0.0);
        assert_eq!(Backoff::new(Duration::from_millis(10), f64::INFINITY).growth, 0.0);
    }

    #[test]
    fn huge_growth_saturates() {
        let backoff = Backoff::new(Duration::from_millis(50), 1e21);
        assert_eq!(backoff.wait_for_cycle(0), Duration::from_millis(50));
        assert_eq!(backoff.wait_for_cycle(1), MAX_CYCLE_WAIT);
        assert_eq!(backoff.wait_for_cycle(u32::MAX), MAX_CYCLE_WAIT);
    }

    #[test]
    fn long_schedule_is_capped() {
        let backoff = Backoff::new(Duration::from_secs(1), 0.5);
        assert_eq!(backoff.wait_for_cycle(100), Duration::from_secs(51));
        assert_eq!(backoff.wait_for_cycle(200), MAX_CYCLE_WAIT);
    }

    #[test]
    fn interrupt_wakes_waiter_without_cancelling() {
        let token = CancelToken::new();
        let remote = token.clone();
        let done = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&done);
        let interrupter = thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                remote.interrupt();
                thread::sleep(Duration::from_millis(2));
            }
        });

        let start = Instant::now();
        let outcome = token.wait(Duration::from_secs(30));
        done.store(true, Ordering::SeqCst);
        interrupter.join().unwrap();

        assert_eq!(outcome, WaitOutcome::Interrupted);
        assert!(!token.is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn wait_elapses_without_cancel() {
        let token = CancelToken::new();
        let start = Instant::now();
        let outcome = token.wait(Duration::from_millis(20));
        assert_ne!(outcome, WaitOutcome::Cancelled);
        if outcome == WaitOutcome::Elapsed {
            assert!(start.elapsed() >= Duration::from_millis(20));
        }
    }

    #[test]
    fn cancelled_token_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        let start = Instant::now();
        assert_eq!(token.wait(Duration::from_secs(10)), WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cancel_from_other_thread_wakes_waiter() {
        let token = CancelToken::new();
        let remote = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });
        let start = Instant::now();
        let mut outcome = token.wait(Duration::from_secs(30));
        while outcome == WaitOutcome::Interrupted {
            outcome = token.wait(Duration::from_secs(30));
        }
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(10));
        handle.join().unwrap();
    }
}
