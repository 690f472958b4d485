// Practice timer - countdown that stops the metronome when it runs out

use std::fmt;
use std::time::Duration;

/// Durations offered by the console, in minutes
pub const DURATION_CHOICES_MIN: [u32; 7] = [1, 5, 10, 15, 20, 30, 60];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Still counting (or paused)
    Running,
    /// Reached zero during this tick; reported once
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeTimer {
    duration: Duration,
    remaining: Duration,
    running: bool,
}

impl PracticeTimer {
    /// Stopped timer set to `duration`
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            remaining: duration,
            running: false,
        }
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self::new(Duration::from_secs(u64::from(minutes) * 60))
    }

    pub fn start(&mut self) {
        if !self.remaining.is_zero() {
            self.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Stop and restore the full duration
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining = self.duration;
    }

    /// Change the duration; the timer is stopped and rewound
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
        self.reset();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Count `elapsed` down
    pub fn tick(&mut self, elapsed: Duration) -> TimerEvent {
        if !self.running {
            return TimerEvent::Running;
        }

        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            self.running = false;
            TimerEvent::Expired
        } else {
            TimerEvent::Running
        }
    }
}

/// Remaining time as m:ss (whole seconds, rounded up)
impl fmt::Display for PracticeTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.remaining.as_secs() + u64::from(self.remaining.subsec_nanos() > 0);
        write!(f, "{}:{:02}", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(PracticeTimer::from_minutes(5).to_string(), "5:00");
        assert_eq!(PracticeTimer::new(Duration::from_secs(61)).to_string(), "1:01");
        assert_eq!(PracticeTimer::new(Duration::from_millis(9_200)).to_string(), "0:10");
        assert_eq!(PracticeTimer::new(Duration::ZERO).to_string(), "0:00");
    }

    #[test]
    fn test_paused_timer_does_not_count() {
        let mut timer = PracticeTimer::from_minutes(1);
        assert_eq!(timer.tick(Duration::from_secs(30)), TimerEvent::Running);
        assert_eq!(timer.remaining(), Duration::from_secs(60));
    }

    #[test]
    fn test_expires_once() {
        let mut timer = PracticeTimer::new(Duration::from_secs(2));
        timer.start();

        assert_eq!(timer.tick(Duration::from_secs(1)), TimerEvent::Running);
        assert_eq!(timer.tick(Duration::from_millis(1500)), TimerEvent::Expired);
        assert!(!timer.is_running());
        assert_eq!(timer.tick(Duration::from_secs(1)), TimerEvent::Running);
        assert_eq!(timer.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_start_after_expiry_needs_reset() {
        let mut timer = PracticeTimer::new(Duration::from_secs(1));
        timer.start();
        timer.tick(Duration::from_secs(1));

        timer.start();
        assert!(!timer.is_running());

        timer.reset();
        timer.start();
        assert!(timer.is_running());
        assert_eq!(timer.remaining(), Duration::from_secs(1));
    }

    #[test]
    fn test_set_duration_rewinds() {
        let mut timer = PracticeTimer::from_minutes(10);
        timer.start();
        timer.tick(Duration::from_secs(90));
        timer.set_duration(Duration::from_secs(300));
        assert!(!timer.is_running());
        assert_eq!(timer.to_string(), "5:00");
    }
}
