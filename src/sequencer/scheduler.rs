// Scheduler - lookahead note scheduling against a clock
//
// The scheduler never plays anything "now". Each step looks at the clock and
// places every note that falls inside the schedule-ahead window at its exact
// clock time. A late step therefore only delays when notes are discovered,
// never when they sound.
//
// This type is single-threaded: whoever owns it drives `step()`. The
// `Metronome` handle wraps it in a mutex and drives it from a lookahead thread.

use crate::audio::renderer::SoundRenderer;
use crate::config::EngineConfig;
use crate::messaging::channels::{BeatConsumer, Broadcaster, StateChangeConsumer};
use crate::messaging::notification::StateChange;
use crate::sequencer::config::{TempoConfig, TempoConfigUpdate};
use crate::sequencer::note_queue::{NoteQueue, ScheduledNote};
use crate::sequencer::note_sequencer::{NoteAction, sequence_note};
use crate::sequencer::speed_trainer::{SpeedTrainer, SpeedTrainerSettings};

/// Lifecycle of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

/// Position of the scheduler in the bar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BeatCursor {
    /// Beat index inside the bar, in [0, beats_per_bar * subdivision)
    pub current_beat_in_bar: u32,
    /// Clock time of the next note to place
    pub next_note_time: f64,
    /// Completed bars since start (or since the speed trainer was enabled)
    pub bars_played: u64,
}

pub struct Scheduler {
    config: TempoConfig,
    cursor: BeatCursor,
    state: RunState,
    trainer: SpeedTrainer,
    renderer: Box<dyn SoundRenderer>,
    queue: NoteQueue,
    state_events: Broadcaster<StateChange>,
    beat_events: Broadcaster<ScheduledNote>,
    schedule_ahead: f64,
    start_offset: f64,
}

impl Scheduler {
    pub fn new(
        config: TempoConfig,
        renderer: Box<dyn SoundRenderer>,
        engine_config: &EngineConfig,
    ) -> Self {
        Self {
            config,
            cursor: BeatCursor::default(),
            state: RunState::Idle,
            trainer: SpeedTrainer::new(),
            renderer,
            queue: NoteQueue::new(),
            state_events: Broadcaster::new("state change"),
            beat_events: Broadcaster::new("beat"),
            schedule_ahead: engine_config.schedule_ahead_secs(),
            start_offset: engine_config.start_offset_secs(),
        }
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn config(&self) -> &TempoConfig {
        &self.config
    }

    pub fn cursor(&self) -> BeatCursor {
        self.cursor
    }

    pub fn speed_trainer(&self) -> SpeedTrainer {
        self.trainer
    }

    /// Handle on the note queue (shares the buffer)
    pub fn note_queue(&self) -> NoteQueue {
        self.queue.clone()
    }

    /// Receive every state change from now on
    pub fn subscribe(&mut self, capacity: usize) -> StateChangeConsumer {
        self.state_events.subscribe(capacity)
    }

    /// Receive every scheduled note (muted ones included) from now on
    pub fn subscribe_beats(&mut self, capacity: usize) -> BeatConsumer {
        self.beat_events.subscribe(capacity)
    }

    /// Idle -> Running. `now` must come from a clock that has been resumed.
    /// Returns false if already running.
    pub fn begin(&mut self, now: f64) -> bool {
        if self.state.is_running() {
            return false;
        }

        let first_note_time = now.max(0.0) + self.start_offset;
        let stale = self.queue.discard_from(first_note_time);
        if stale > 0 {
            log::debug!("Discarded {} queued notes from the previous run", stale);
        }

        self.cursor = BeatCursor {
            current_beat_in_bar: 0,
            next_note_time: first_note_time,
            bars_played: 0,
        };
        self.state = RunState::Running;
        log::info!("Metronome started: {}", self.config);
        self.state_events.publish(StateChange::playing(true));
        true
    }

    /// Running -> Idle. The cursor is left as it is.
    /// Returns false if already idle.
    pub fn halt(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.state = RunState::Idle;
        log::info!("Metronome stopped after {} bars", self.cursor.bars_played);
        self.state_events.publish(StateChange::playing(false));
        true
    }

    /// One lookahead pass: place every note due before `now + schedule_ahead`
    /// Returns the number of notes placed.
    pub fn step(&mut self, now: f64) -> usize {
        if !self.state.is_running() {
            return 0;
        }

        let horizon = now + self.schedule_ahead;
        let mut placed = 0;
        while self.cursor.next_note_time < horizon {
            // A meter change may have left the cursor past the end of the bar
            if self.cursor.current_beat_in_bar >= self.config.notes_per_bar() {
                self.complete_bar();
            }

            if self.cursor.next_note_time < now {
                log::debug!(
                    "Late note: beat {} due at {:.4}s, clock at {:.4}s",
                    self.cursor.current_beat_in_bar,
                    self.cursor.next_note_time,
                    now
                );
            }

            self.schedule_note(self.cursor.current_beat_in_bar, self.cursor.next_note_time);
            self.advance_cursor();
            placed += 1;
        }
        placed
    }

    fn schedule_note(&mut self, beat: u32, time: f64) {
        let note = ScheduledNote::new(beat, time);

        // Muted beats still reach the queue and beat subscribers (visual sync)
        if let NoteAction::Play { timbre, accent } = sequence_note(beat, &self.config) {
            self.renderer.render(time, timbre, accent);
        }

        self.beat_events.publish(note);
        self.queue.push(note);
    }

    fn advance_cursor(&mut self) {
        self.cursor.next_note_time += self.config.note_interval_seconds();
        self.cursor.current_beat_in_bar += 1;
        if self.cursor.current_beat_in_bar >= self.config.notes_per_bar() {
            self.complete_bar();
        }
    }

    fn complete_bar(&mut self) {
        self.cursor.current_beat_in_bar = 0;
        self.cursor.bars_played += 1;

        if let Some(bpm) = self
            .trainer
            .on_bar_complete(self.cursor.bars_played, self.config.bpm())
        {
            if self.config.set_bpm(bpm) {
                log::debug!(
                    "Speed trainer: {:.1} BPM after {} bars",
                    self.config.bpm(),
                    self.cursor.bars_played
                );
                self.state_events.publish(StateChange::bpm(self.config.bpm()));
            }
        }
    }

    /// Apply a partial configuration
    ///
    /// Takes effect from the next computed interval / mute decision; notes
    /// already placed are never touched. Emits a single `StateChange` with
    /// every field that actually changed.
    pub fn configure(&mut self, update: TempoConfigUpdate) {
        let mut change = StateChange::default();

        if let Some(bpm) = update.bpm {
            if self.config.set_bpm(bpm) {
                change.bpm = Some(self.config.bpm());
            }
        }

        if let Some(beats_per_bar) = update.beats_per_bar {
            let previous = self.config.beats_per_bar();
            let resized = self.config.set_beats_per_bar(beats_per_bar);
            if self.config.beats_per_bar() != previous {
                change.beats_per_bar = Some(self.config.beats_per_bar());
            }
            if resized {
                change.muted_beats = Some(self.config.muted_beats().clone());
            }
        }

        if let Some(note_value) = update.note_value {
            let previous = self.config.note_value();
            if self.config.set_note_value(note_value) && self.config.note_value() != previous {
                change.note_value = Some(note_value);
            }
        }

        if let Some(subdivision) = update.subdivision {
            let previous = self.config.subdivision();
            self.config.set_subdivision(subdivision);
            if self.config.subdivision() != previous {
                change.subdivision = Some(self.config.subdivision());
            }
        }

        if let Some(sound_preset) = update.sound_preset {
            if sound_preset != self.config.sound_preset() {
                self.config.set_sound_preset(sound_preset);
                change.sound_preset = Some(sound_preset);
            }
        }

        if let Some(muted_beats) = update.muted_beats {
            let previous = self.config.muted_beats().clone();
            self.config.set_muted_beats(&muted_beats);
            if *self.config.muted_beats() != previous {
                change.muted_beats = Some(self.config.muted_beats().clone());
            }
        }

        if !change.is_empty() {
            self.state_events.publish(change);
        }
    }

    /// Replace the whole mute pattern (normalized to beats_per_bar entries)
    pub fn set_muted_beats(&mut self, muted_beats: &[bool]) {
        self.config.set_muted_beats(muted_beats);
        self.state_events
            .publish(StateChange::muted_beats(self.config.muted_beats().clone()));
    }

    /// Flip one main beat's mute flag; out-of-range indices are ignored
    pub fn toggle_mute(&mut self, index: usize) {
        if self.config.toggle_mute(index) {
            self.state_events
                .publish(StateChange::muted_beats(self.config.muted_beats().clone()));
        }
    }

    /// Enable the speed trainer: restart the bar count and jump to its start tempo
    pub fn enable_speed_trainer(&mut self, settings: SpeedTrainerSettings) {
        let start_bpm = self.trainer.enable(settings);
        self.cursor.bars_played = 0;
        self.config.set_bpm(start_bpm);
        log::info!(
            "Speed trainer enabled: {:.1} -> {:.1} BPM",
            self.trainer.settings().start_bpm,
            self.trainer.settings().end_bpm
        );
        self.state_events.publish(StateChange::bpm(self.config.bpm()));
    }

    pub fn disable_speed_trainer(&mut self) {
        self.trainer.disable();
    }

    /// Remove and return the notes due at `now`
    pub fn poll(&self, now: f64) -> Vec<ScheduledNote> {
        self.queue.poll(now)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("cursor", &self.cursor)
            .field("state", &self.state)
            .field("trainer", &self.trainer)
            .finish_non_exhaustive()
    }
}
