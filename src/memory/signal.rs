//! Pool state-change signal.
//!
//! A single-slot, broadcast condition. The pool raises it when it goes from
//! fully issued back to having a free frame; anyone waiting for an output
//! frame is woken and should retry `acquire()`. Raising an already raised
//! signal is a no-op, and the signal is a hint only: a woken waiter can still
//! lose the race for the freed frame.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Broadcast "a frame became free" signal.
#[derive(Debug, Default)]
pub struct PoolSignal {
    raised: Mutex<bool>,
    cond: Condvar,
}

impl PoolSignal {
    /// Create a signal in the reset state.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.raised.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Raise the signal and wake every waiter.
    pub fn raise(&self) {
        *self.lock() = true;
        self.cond.notify_all();
    }

    /// Clear the signal.
    pub fn reset(&self) {
        *self.lock() = false;
    }

    /// Whether the signal is currently raised.
    pub fn is_raised(&self) -> bool {
        *self.lock()
    }

    /// Wait until the signal is raised or `timeout` elapses.
    ///
    /// Returns `true` if the signal was raised. The signal stays raised;
    /// callers reset it once they have acted on it.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut raised = self.lock();
        while !*raised {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(raised, remaining)
                .unwrap_or_else(|e| e.into_inner());
            raised = guard;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_raise_and_reset() {
        let signal = PoolSignal::new();
        assert!(!signal.is_raised());

        signal.raise();
        signal.raise();
        assert!(signal.is_raised());

        signal.reset();
        assert!(!signal.is_raised());
    }

    #[test]
    fn test_wait_times_out_when_not_raised() {
        let signal = PoolSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_wait_returns_immediately_when_raised() {
        let signal = PoolSignal::new();
        signal.raise();
        assert!(signal.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn test_broadcast_wakes_all_waiters() {
        let signal = Arc::new(PoolSignal::new());

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let signal = signal.clone();
                thread::spawn(move || signal.wait_timeout(Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        signal.raise();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
