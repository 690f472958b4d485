// Audio timing utilities - sample position counter shared with the audio callback
// The stream clock reads seconds from here; click requests are converted to sample indices

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared audio timing state
#[derive(Debug, Clone)]
pub struct AudioTiming {
    /// Frames rendered so far (incremented by audio callback)
    sample_position: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioTiming {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate as f64,
        }
    }

    /// Get current sample position (called from the scheduler thread)
    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Acquire)
    }

    /// Advance sample position (called from audio callback)
    pub fn advance(&self, frames: usize) {
        self.sample_position
            .fetch_add(frames as u64, Ordering::Release);
    }

    /// Current position in seconds
    pub fn current_seconds(&self) -> f64 {
        self.samples_to_seconds(self.current_sample())
    }

    pub fn samples_to_seconds(&self, samples: u64) -> f64 {
        samples as f64 / self.sample_rate
    }

    /// Convert an absolute clock time to the sample it should start on
    /// Negative or non-finite times map to sample 0
    pub fn seconds_to_samples(&self, seconds: f64) -> u64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (seconds * self.sample_rate).round() as u64
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }
}
