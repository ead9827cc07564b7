//! Time sources and cancellation
//!
//! The timer never touches `Instant` or `thread::sleep` directly; it goes
//! through [`Clock`] so the loop can be driven by a simulated clock in tests.
//! Interrupts are delivered through a [`CancelToken`] that also wakes any
//! sleep in progress.

use chrono::{Local, NaiveTime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// How a sleep ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The full duration elapsed
    Elapsed,
    /// The cancel token fired first
    Cancelled,
}

/// Monotonic time, local wall-clock time and interruptible sleep
pub trait Clock {
    /// Monotonic time since an arbitrary fixed origin
    fn now(&self) -> Duration;

    /// Local time of day for display
    fn time_of_day(&self) -> NaiveTime;

    /// Block for `duration` or until `cancel` fires
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Wake;
}

/// Real clock backed by `Instant` and `chrono::Local`
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn time_of_day(&self) -> NaiveTime {
        Local::now().time()
    }

    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Wake {
        cancel.wait_timeout(duration)
    }
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    wake: Condvar,
    armed: AtomicBool,
}

/// Shared interrupt flag.
///
/// Cloned into the signal handler; the timer loop checks it every tick and
/// sleeps on it so a cancel takes effect immediately.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    /// Create an unarmed token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation and wake every sleeper
    pub fn cancel(&self) {
        let mut cancelled = self.lock();
        *cancelled = true;
        self.state.wake.notify_all();
    }

    /// Whether `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Mark the token as having a listener for the lifetime of the guard.
    ///
    /// Outside an armed region nobody polls the token, so the signal
    /// handler has to act on its own.
    pub fn arm(&self) -> ArmGuard {
        self.state.armed.store(true, Ordering::SeqCst);
        ArmGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Whether an `ArmGuard` is currently alive
    pub fn is_armed(&self) -> bool {
        self.state.armed.load(Ordering::SeqCst)
    }

    /// Wait up to `timeout`, returning early if cancelled
    pub fn wait_timeout(&self, timeout: Duration) -> Wake {
        let guard = self.lock();
        let (guard, _) = match self
            .state
            .wake
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
        {
            Ok(result) => result,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *guard {
            Wake::Cancelled
        } else {
            Wake::Elapsed
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, bool> {
        // The flag is a plain bool, so a poisoned lock still holds a valid value.
        self.state
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Disarms the token when dropped
pub struct ArmGuard {
    state: Arc<CancelState>,
}

impl Drop for ArmGuard {
    fn drop(&mut self) {
        self.state.armed.store(false, Ordering::SeqCst);
    }
}
