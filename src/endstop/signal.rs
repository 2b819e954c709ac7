//! Single-slot event shared between the end-stop context and the stage thread.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A set / clear / wait flag.
///
/// `set` may be called from any thread, typically from an end-stop callback; the
/// stage thread polls `is_set` between motor pulses or blocks in `wait_timeout`.
#[derive(Debug, Default)]
pub struct HomeSignal {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl HomeSignal {
    /// Create a cleared signal.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a bool half-written.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raise the flag and wake every waiter.
    pub fn set(&self) {
        *self.lock() = true;
        self.cond.notify_all();
    }

    /// Lower the flag.
    pub fn clear(&self) {
        *self.lock() = false;
    }

    /// Current flag value.
    pub fn is_set(&self) -> bool {
        *self.lock()
    }

    /// Block until the flag is set or `timeout` elapses; returns the flag.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |set| !*set)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_and_clear() {
        let signal = HomeSignal::new();
        assert!(!signal.is_set());

        signal.set();
        assert!(signal.is_set());

        signal.clear();
        assert!(!signal.is_set());
    }

    #[test]
    fn test_wait_times_out_when_unset() {
        let signal = HomeSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_wait_wakes_on_set_from_other_thread() {
        let signal = Arc::new(HomeSignal::new());
        let setter = Arc::clone(&signal);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            setter.set();
        });

        assert!(signal.wait_timeout(Duration::from_secs(5)));
        handle.join().unwrap();
    }
}
