// State change notifications - partial engine state pushed to subscribers

use crate::sequencer::config::SoundPreset;
use std::sync::Arc;

/// Partial metronome state: only the fields that changed are `Some`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateChange {
    pub is_playing: Option<bool>,
    pub bpm: Option<f64>,
    pub beats_per_bar: Option<u32>,
    pub note_value: Option<u32>,
    pub subdivision: Option<u32>,
    pub sound_preset: Option<SoundPreset>,
    pub muted_beats: Option<Arc<[bool]>>,
}

impl StateChange {
    /// Play state transition
    pub fn playing(is_playing: bool) -> Self {
        Self {
            is_playing: Some(is_playing),
            ..Self::default()
        }
    }

    /// Tempo change (manual or speed trainer)
    pub fn bpm(bpm: f64) -> Self {
        Self {
            bpm: Some(bpm),
            ..Self::default()
        }
    }

    /// Mute pattern change
    pub fn muted_beats(muted_beats: Arc<[bool]>) -> Self {
        Self {
            muted_beats: Some(muted_beats),
            ..Self::default()
        }
    }

    /// True if no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
