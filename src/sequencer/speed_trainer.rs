// Speed trainer - ramps the tempo up every N completed bars until a ceiling

use super::config::sanitize_bpm;
use serde::{Deserialize, Serialize};

/// Speed trainer parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedTrainerSettings {
    /// Tempo applied when the trainer is enabled
    pub start_bpm: f64,
    /// Ceiling, never exceeded
    pub end_bpm: f64,
    /// BPM added at each step (>= 1)
    pub increment: f64,
    /// Completed bars between two steps (>= 1)
    pub interval: u32,
}

impl SpeedTrainerSettings {
    pub fn new(start_bpm: f64, end_bpm: f64, increment: f64, interval: u32) -> Self {
        Self {
            start_bpm,
            end_bpm,
            increment,
            interval,
        }
        .sanitized()
    }

    /// Clamp every field so progression can neither stall nor divide by zero
    pub fn sanitized(self) -> Self {
        let increment = if self.increment.is_finite() {
            self.increment.max(1.0)
        } else {
            1.0
        };
        Self {
            start_bpm: sanitize_bpm(self.start_bpm),
            end_bpm: sanitize_bpm(self.end_bpm),
            increment,
            interval: self.interval.max(1),
        }
    }
}

impl Default for SpeedTrainerSettings {
    fn default() -> Self {
        Self::new(100.0, 120.0, 5.0, 4)
    }
}

/// Tempo-ramp state machine (Disabled / Enabled)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedTrainer {
    enabled: bool,
    settings: SpeedTrainerSettings,
}

impl SpeedTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn settings(&self) -> SpeedTrainerSettings {
        self.settings
    }

    /// Enter Enabled with the given (sanitized) settings
    /// Returns the tempo the caller must apply immediately
    pub fn enable(&mut self, settings: SpeedTrainerSettings) -> f64 {
        self.settings = settings.sanitized();
        self.enabled = true;
        self.settings.start_bpm
    }

    /// Enter Disabled; the current tempo is left as it is
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Called once per completed bar
    ///
    /// Returns the new tempo when a step is due: every `interval` bars while
    /// the tempo is below the ceiling, by `increment`, capped at `end_bpm`.
    pub fn on_bar_complete(&self, bars_played: u64, current_bpm: f64) -> Option<f64> {
        if !self.enabled {
            return None;
        }

        let interval = u64::from(self.settings.interval.max(1));
        if bars_played > 0 && bars_played % interval == 0 && current_bpm < self.settings.end_bpm
        {
            Some(
                (current_bpm + self.settings.increment)
                    .min(self.settings.end_bpm),
            )
        } else {
            None
        }
    }
}
