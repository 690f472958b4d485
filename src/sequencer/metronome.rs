// Metronome - owned engine handle
// Ties the clock, the scheduler and the lookahead thread together

use super::config::{TempoConfig, TempoConfigUpdate};
use super::lookahead::LookaheadTimer;
use super::note_queue::{NoteQueue, ScheduledNote};
use super::scheduler::{BeatCursor, Scheduler};
use super::speed_trainer::{SpeedTrainer, SpeedTrainerSettings};
use crate::audio::clock::{Clock, ClockError};
use crate::audio::renderer::SoundRenderer;
use crate::config::EngineConfig;
use crate::messaging::channels::{BeatConsumer, StateChangeConsumer};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Metronome error types
#[derive(Debug, thiserror::Error)]
pub enum MetronomeError {
    #[error("Clock could not be resumed: {0}")]
    Clock(#[from] ClockError),

    #[error("Failed to spawn lookahead thread: {0}")]
    Timer(#[from] std::io::Error),
}

/// A metronome instance
///
/// Each instance is independent: create as many as needed. Configuration
/// calls may be made while stopped or running and only affect notes that
/// have not been scheduled yet.
pub struct Metronome {
    scheduler: Arc<Mutex<Scheduler>>,
    clock: Arc<dyn Clock>,
    queue: NoteQueue,
    timer: Option<LookaheadTimer>,
    lookahead_interval: Duration,
    event_capacity: usize,
}

impl Metronome {
    pub fn new(
        clock: Arc<dyn Clock>,
        renderer: Box<dyn SoundRenderer>,
        config: TempoConfig,
        engine_config: &EngineConfig,
    ) -> Self {
        let scheduler = Scheduler::new(config, renderer, engine_config);
        let queue = scheduler.note_queue();
        Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            clock,
            queue,
            timer: None,
            lookahead_interval: engine_config.lookahead_interval(),
            event_capacity: engine_config.event_capacity.max(1),
        }
    }

    fn scheduler(&self) -> MutexGuard<'_, Scheduler> {
        lock_scheduler(&self.scheduler)
    }

    /// Start scheduling
    ///
    /// Waits for `Clock::resume()` first; if it fails nothing is scheduled and
    /// the metronome stays stopped. No-op when already running.
    pub fn start(&mut self) -> Result<(), MetronomeError> {
        if self.is_playing() {
            return Ok(());
        }

        if let Err(e) = self.clock.resume() {
            log::error!("Cannot start metronome: {}", e);
            return Err(e.into());
        }

        let now = self.clock.now();
        self.scheduler().begin(now);

        let scheduler = Arc::clone(&self.scheduler);
        let clock = Arc::clone(&self.clock);
        let timer = LookaheadTimer::spawn(self.lookahead_interval, move || {
            let now = clock.now();
            lock_scheduler(&scheduler).step(now);
        });

        match timer {
            Ok(timer) => {
                self.timer = Some(timer);
                Ok(())
            }
            Err(e) => {
                self.scheduler().halt();
                Err(e.into())
            }
        }
    }

    /// Stop scheduling
    ///
    /// When this returns the lookahead thread has exited: no further note is
    /// queued or rendered. No-op when already stopped.
    pub fn stop(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
        self.scheduler().halt();
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler().is_running()
    }

    /// Apply a partial configuration
    pub fn configure(&self, update: TempoConfigUpdate) {
        if !update.is_empty() {
            self.scheduler().configure(update);
        }
    }

    pub fn set_bpm(&self, bpm: f64) {
        self.configure(TempoConfigUpdate {
            bpm: Some(bpm),
            ..Default::default()
        });
    }

    pub fn set_muted_beats(&self, muted_beats: &[bool]) {
        self.scheduler().set_muted_beats(muted_beats);
    }

    /// Flip the mute flag of main beat `index` (ignored if out of range)
    pub fn toggle_mute(&self, index: usize) {
        self.scheduler().toggle_mute(index);
    }

    pub fn enable_speed_trainer(&self, settings: SpeedTrainerSettings) {
        self.scheduler().enable_speed_trainer(settings);
    }

    pub fn disable_speed_trainer(&self) {
        self.scheduler().disable_speed_trainer();
    }

    /// Notes due at `now` (clock seconds), oldest first, each returned once
    pub fn poll(&self, now: f64) -> Vec<ScheduledNote> {
        self.queue.poll(now)
    }

    /// Notes due at the current clock time
    pub fn poll_now(&self) -> Vec<ScheduledNote> {
        self.poll(self.clock.now())
    }

    /// Handle on the note queue, for a consumer on another thread
    pub fn note_queue(&self) -> NoteQueue {
        self.queue.clone()
    }

    /// Subscribe to state changes (play state, tempo, meter, mutes...)
    pub fn subscribe(&self) -> StateChangeConsumer {
        self.scheduler().subscribe(self.event_capacity)
    }

    /// Subscribe to every scheduled note, muted ones included
    pub fn subscribe_beats(&self) -> BeatConsumer {
        self.scheduler().subscribe_beats(self.event_capacity)
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> TempoConfig {
        self.scheduler().config().clone()
    }

    pub fn cursor(&self) -> BeatCursor {
        self.scheduler().cursor()
    }

    pub fn speed_trainer(&self) -> SpeedTrainer {
        self.scheduler().speed_trainer()
    }

    /// Current clock time
    pub fn now(&self) -> f64 {
        self.clock.now()
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

impl std::fmt::Debug for Metronome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metronome")
            .field("scheduler", &*self.scheduler())
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

fn lock_scheduler(scheduler: &Mutex<Scheduler>) -> MutexGuard<'_, Scheduler> {
    scheduler.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::clock::ManualClock;
    use crate::audio::renderer::NullRenderer;
    use crate::messaging::notification::StateChange;
    use ringbuf::traits::Consumer;

    fn metronome(clock: &ManualClock) -> Metronome {
        Metronome::new(
            Arc::new(clock.clone()),
            Box::new(NullRenderer),
            TempoConfig::default(),
            &EngineConfig::default(),
        )
    }

    #[test]
    fn test_start_stop_cycle() {
        let clock = ManualClock::new();
        let mut metronome = metronome(&clock);
        assert!(!metronome.is_playing());

        metronome.start().unwrap();
        assert!(metronome.is_playing());
        metronome.start().unwrap(); // No-op

        metronome.stop();
        assert!(!metronome.is_playing());
        metronome.stop(); // No-op
    }

    #[test]
    fn test_start_fails_on_suspended_clock() {
        let clock = ManualClock::new();
        clock.set_suspended(true);
        let mut metronome = metronome(&clock);
        let mut rx = metronome.subscribe();

        assert!(matches!(
            metronome.start(),
            Err(MetronomeError::Clock(ClockError::Suspended))
        ));
        assert!(!metronome.is_playing());
        assert!(metronome.note_queue().is_empty());
        assert_eq!(rx.try_pop(), None);

        clock.set_suspended(false);
        metronome.start().unwrap();
        assert_eq!(rx.try_pop(), Some(StateChange::playing(true)));
    }

    #[test]
    fn test_configure_while_stopped() {
        let clock = ManualClock::new();
        let metronome = metronome(&clock);
        metronome.set_bpm(90.0);
        metronome.toggle_mute(0);

        let config = metronome.config();
        assert_eq!(config.bpm(), 90.0);
        assert!(config.is_beat_muted(0));
    }

    #[test]
    fn test_drop_while_running() {
        let clock = ManualClock::new();
        let mut metronome = metronome(&clock);
        let queue = metronome.note_queue();
        metronome.start().unwrap();
        drop(metronome);

        let queued = queue.len();
        std::thread::sleep(Duration::from_millis(60));
        clock.advance(10.0);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(queue.len(), queued);
    }
}
