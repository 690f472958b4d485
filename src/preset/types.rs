// Persisted records (camelCase JSON)

use crate::sequencer::config::{SoundPreset, TempoConfig, TempoConfigUpdate};
use serde::{Deserialize, Serialize};

/// Snapshot of the user-facing metronome settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetronomeSettings {
    pub bpm: f64,
    pub beats_per_bar: u32,
    /// 4 for quarter note, 8 for eighth note
    pub note_value: u32,
    pub subdivision: u32,
    pub sound_preset: SoundPreset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted_beats: Option<Vec<bool>>,
}

impl Default for MetronomeSettings {
    fn default() -> Self {
        Self::from(&TempoConfig::default())
    }
}

impl From<&TempoConfig> for MetronomeSettings {
    fn from(config: &TempoConfig) -> Self {
        Self {
            bpm: config.bpm(),
            beats_per_bar: config.beats_per_bar(),
            note_value: config.note_value(),
            subdivision: config.subdivision(),
            sound_preset: config.sound_preset(),
            muted_beats: Some(config.muted_beats().to_vec()),
        }
    }
}

impl From<MetronomeSettings> for TempoConfigUpdate {
    fn from(settings: MetronomeSettings) -> Self {
        Self {
            bpm: Some(settings.bpm),
            beats_per_bar: Some(settings.beats_per_bar),
            note_value: Some(settings.note_value),
            subdivision: Some(settings.subdivision),
            sound_preset: Some(settings.sound_preset),
            muted_beats: settings.muted_beats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub settings: MetronomeSettings,
}

impl Preset {
    /// New preset with a fresh id
    pub fn new(name: impl Into<String>, settings: MetronomeSettings) -> Self {
        Self {
            id: super::generate_id(),
            name: name.into(),
            settings,
        }
    }
}

/// Ordered list of presets (a set played in sequence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setlist {
    pub id: String,
    pub name: String,
    pub presets: Vec<Preset>,
}

impl Setlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: super::generate_id(),
            name: name.into(),
            presets: Vec::new(),
        }
    }
}
