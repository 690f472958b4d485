// MyMusic Metronome - Library exports for the console app, tests and benchmarks

pub mod audio;
pub mod config;
pub mod logger;
pub mod messaging;
pub mod practice;
pub mod preset;
pub mod sequencer;

/// Directory name used under the platform config and data directories
pub const APP_DIR_NAME: &str = "mymusic_metronome";

// Re-export commonly used types for convenience
pub use audio::clock::{Clock, ClockError, ManualClock, SystemClock};
pub use audio::engine::{AudioError, AudioOutput};
pub use audio::renderer::{NullRenderer, SoundRenderer};
pub use config::{ConfigError, EngineConfig};
pub use messaging::command::Command;
pub use messaging::notification::StateChange;
pub use preset::{JsonFileStore, MetronomeSettings, Preset, PresetStore, Setlist};
pub use sequencer::{
    Metronome, MetronomeError, ScheduledNote, Scheduler, SoundPreset, SpeedTrainerSettings,
    TempoConfig, TempoConfigUpdate,
};
