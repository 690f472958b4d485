// Sequencer module
// Tempo configuration, lookahead scheduling and the metronome handle

pub mod config;
pub mod lookahead;
pub mod metronome;
pub mod note_queue;
pub mod note_sequencer;
pub mod scheduler;
pub mod speed_trainer;

pub use config::{SoundPreset, TempoConfig, TempoConfigUpdate};
pub use metronome::{Metronome, MetronomeError};
pub use note_queue::{NoteQueue, ScheduledNote};
pub use scheduler::{BeatCursor, RunState, Scheduler};
pub use speed_trainer::{SpeedTrainer, SpeedTrainerSettings};
