// Clock - Monotonic time source for note scheduling
// Every scheduled note time is expressed in seconds of the clock that drives the engine

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Clock error types
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("Audio clock is suspended")]
    Suspended,

    #[error("Audio output did not start within {0:?}")]
    ResumeTimeout(Duration),

    #[error("Audio clock unavailable: {0}")]
    Unavailable(String),
}

/// Time source used by the scheduler
///
/// `now()` is monotonic and non-negative with an arbitrary origin.
/// `resume()` blocks until the underlying output is active; nothing may be
/// scheduled against a clock whose `resume()` has not succeeded.
pub trait Clock: Send + Sync {
    /// Current time in seconds
    fn now(&self) -> f64;

    /// Make sure the clock is running (and audible)
    fn resume(&self) -> Result<(), ClockError>;
}

/// Wall clock based on `Instant`, always running
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn resume(&self) -> Result<(), ClockError> {
        Ok(())
    }
}

/// Manually driven clock for offline rendering and deterministic tests
///
/// Clones share the same time and suspension state.
#[derive(Debug, Clone)]
pub struct ManualClock {
    seconds_bits: Arc<AtomicU64>,
    suspended: Arc<AtomicBool>,
}

impl ManualClock {
    /// Create a clock at t = 0, not suspended
    pub fn new() -> Self {
        Self {
            seconds_bits: Arc::new(AtomicU64::new(0.0f64.to_bits())),
            suspended: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Jump to an absolute time (ignored if it would go backwards)
    pub fn set(&self, seconds: f64) {
        if seconds.is_finite() && seconds >= self.now() {
            self.seconds_bits.store(seconds.to_bits(), Ordering::Release);
        }
    }

    /// Move forward by `seconds`
    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds.max(0.0));
    }

    /// Make subsequent `resume()` calls fail (simulates a withheld output)
    pub fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.seconds_bits.load(Ordering::Acquire))
    }

    fn resume(&self) -> Result<(), ClockError> {
        if self.is_suspended() {
            Err(ClockError::Suspended)
        } else {
            Ok(())
        }
    }
}
