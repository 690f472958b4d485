// Lookahead timer - cancellable repeating task driving the scheduler
// Runs on its own thread; cancel() returns only once the thread has exited

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct LookaheadTimer {
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LookaheadTimer {
    /// Run `step` immediately, then every `interval` until cancelled
    pub fn spawn<F>(interval: Duration, mut step: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = thread::Builder::new()
            .name("metronome-lookahead".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Acquire) {
                    step();
                    // Woken early by cancel()
                    thread::park_timeout(interval);
                }
            })?;

        Ok(Self {
            cancelled,
            handle: Some(handle),
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Stop the task and wait for the thread to finish
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                log::error!("Lookahead thread panicked");
            }
        }
    }
}

impl Drop for LookaheadTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for LookaheadTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookaheadTimer")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_runs_immediately_and_repeats() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let mut timer = LookaheadTimer::spawn(Duration::from_millis(2), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        timer.cancel();
        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_no_step_after_cancel() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let mut timer = LookaheadTimer::spawn(Duration::from_millis(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(10));
        timer.cancel();
        assert!(timer.is_cancelled());

        let after_cancel = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn test_cancel_wakes_long_interval() {
        let mut timer = LookaheadTimer::spawn(Duration::from_secs(60), || {}).unwrap();
        let start = std::time::Instant::now();
        timer.cancel();
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
