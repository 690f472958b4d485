// Tap tempo - average of the last few tap intervals

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Taps kept for the average
pub const MAX_TAPS: usize = 4;
/// A longer pause starts a new sequence
pub const RESET_GAP: Duration = Duration::from_secs(2);
/// Lowest reported tempo
pub const MIN_TAP_BPM: f64 = 30.0;
/// Highest reported tempo
pub const MAX_TAP_BPM: f64 = 300.0;

#[derive(Debug, Clone, Default)]
pub struct TapTempo {
    taps: VecDeque<Instant>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self {
            taps: VecDeque::with_capacity(MAX_TAPS + 1),
        }
    }

    /// Register a tap now
    pub fn tap(&mut self) -> Option<f64> {
        self.tap_at(Instant::now())
    }

    /// Register a tap at `instant`
    ///
    /// Returns the rounded tempo once two taps are known, unless it falls
    /// outside 30..=300 BPM.
    pub fn tap_at(&mut self, instant: Instant) -> Option<f64> {
        if let Some(&last) = self.taps.back()
            && instant.saturating_duration_since(last) > RESET_GAP
        {
            self.taps.clear();
        }

        self.taps.push_back(instant);
        if self.taps.len() > MAX_TAPS {
            self.taps.pop_front();
        }

        self.bpm()
    }

    /// Tempo implied by the current taps
    pub fn bpm(&self) -> Option<f64> {
        let (first, last) = (self.taps.front()?, self.taps.back()?);
        let intervals = self.taps.len().checked_sub(1).filter(|&n| n > 0)?;

        let average = last.saturating_duration_since(*first).as_secs_f64() / intervals as f64;
        if average <= 0.0 {
            return None;
        }

        let bpm = (60.0 / average).round();
        (MIN_TAP_BPM..=MAX_TAP_BPM).contains(&bpm).then_some(bpm)
    }

    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    pub fn reset(&mut self) {
        self.taps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taps(tap_tempo: &mut TapTempo, start: Instant, gaps_ms: &[u64]) -> Option<f64> {
        let mut at = start;
        let mut bpm = tap_tempo.tap_at(at);
        for gap in gaps_ms {
            at += Duration::from_millis(*gap);
            bpm = tap_tempo.tap_at(at);
        }
        bpm
    }

    #[test]
    fn test_single_tap_reports_nothing() {
        let mut tap_tempo = TapTempo::new();
        assert_eq!(tap_tempo.tap_at(Instant::now()), None);
    }

    #[test]
    fn test_steady_taps() {
        let mut tap_tempo = TapTempo::new();
        assert_eq!(taps(&mut tap_tempo, Instant::now(), &[500, 500, 500]), Some(120.0));
    }

    #[test]
    fn test_average_is_rounded() {
        let mut tap_tempo = TapTempo::new();
        // 60 / 0.55 = 109.09
        assert_eq!(taps(&mut tap_tempo, Instant::now(), &[500, 600]), Some(109.0));
    }

    #[test]
    fn test_keeps_last_four_taps() {
        let mut tap_tempo = TapTempo::new();
        let bpm = taps(&mut tap_tempo, Instant::now(), &[1000, 1000, 500, 500, 500]);
        assert_eq!(tap_tempo.tap_count(), MAX_TAPS);
        assert_eq!(bpm, Some(120.0));
    }

    #[test]
    fn test_long_gap_resets() {
        let mut tap_tempo = TapTempo::new();
        let start = Instant::now();
        taps(&mut tap_tempo, start, &[500, 500]);

        assert_eq!(tap_tempo.tap_at(start + Duration::from_millis(3500)), None);
        assert_eq!(tap_tempo.tap_count(), 1);
    }

    #[test]
    fn test_out_of_range_not_reported() {
        let mut tap_tempo = TapTempo::new();
        // 150ms -> 400 BPM
        assert_eq!(taps(&mut tap_tempo, Instant::now(), &[150, 150]), None);
        assert_eq!(tap_tempo.tap_count(), 3);
    }
}
