// Tempo configuration - bpm, meter, subdivision, sound and mute pattern
// Values are sanitized on the way in so the timing math never divides by zero

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Lowest tempo the engine will schedule at
pub const MIN_BPM: f64 = 1.0;
/// Highest tempo the engine will schedule at
pub const MAX_BPM: f64 = 1000.0;
/// Upper bound for beats per bar and for subdivision
pub const MAX_DIVISIONS: u32 = 64;
/// Accepted note values (meter denominator, informational only)
pub const NOTE_VALUES: [u32; 6] = [1, 2, 4, 8, 16, 32];

/// Sound preset (timbre) used for main beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundPreset {
    #[default]
    Beep,
    Click,
    Woodblock,
}

impl SoundPreset {
    pub const ALL: [SoundPreset; 3] = [SoundPreset::Beep, SoundPreset::Click, SoundPreset::Woodblock];

    pub fn name(&self) -> &'static str {
        match self {
            SoundPreset::Beep => "beep",
            SoundPreset::Click => "click",
            SoundPreset::Woodblock => "woodblock",
        }
    }
}

impl fmt::Display for SoundPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SoundPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beep" => Ok(SoundPreset::Beep),
            "click" => Ok(SoundPreset::Click),
            "woodblock" => Ok(SoundPreset::Woodblock),
            other => Err(format!("Unknown sound preset: {}", other)),
        }
    }
}

/// Clamp a tempo into the schedulable range (non-finite values become MIN_BPM)
pub fn sanitize_bpm(bpm: f64) -> f64 {
    if bpm.is_finite() {
        bpm.clamp(MIN_BPM, MAX_BPM)
    } else {
        MIN_BPM
    }
}

/// Clamp beats per bar / subdivision into [1, MAX_DIVISIONS]
pub fn sanitize_divisions(value: u32) -> u32 {
    value.clamp(1, MAX_DIVISIONS)
}

/// Resize a mute pattern to `len`, keeping existing flags by index
/// New indices default to unmuted
pub fn resize_muted_beats(muted: &[bool], len: usize) -> Arc<[bool]> {
    (0..len)
        .map(|i| muted.get(i).copied().unwrap_or(false))
        .collect()
}

/// Complete tempo description consumed by the scheduler
///
/// `muted_beats` is an immutable shared slice: every change replaces it
/// wholesale, so a snapshot can be handed to another thread without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoConfig {
    bpm: f64,
    beats_per_bar: u32,
    note_value: u32,
    subdivision: u32,
    sound_preset: SoundPreset,
    muted_beats: Arc<[bool]>,
}

impl TempoConfig {
    pub fn new(bpm: f64, beats_per_bar: u32) -> Self {
        let beats_per_bar = sanitize_divisions(beats_per_bar);
        Self {
            bpm: sanitize_bpm(bpm),
            beats_per_bar,
            note_value: 4,
            subdivision: 1,
            sound_preset: SoundPreset::default(),
            muted_beats: resize_muted_beats(&[], beats_per_bar as usize),
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    pub fn note_value(&self) -> u32 {
        self.note_value
    }

    pub fn subdivision(&self) -> u32 {
        self.subdivision
    }

    pub fn sound_preset(&self) -> SoundPreset {
        self.sound_preset
    }

    pub fn muted_beats(&self) -> &Arc<[bool]> {
        &self.muted_beats
    }

    /// Number of scheduled notes in one bar
    pub fn notes_per_bar(&self) -> u32 {
        self.beats_per_bar * self.subdivision
    }

    /// Seconds between two consecutive notes: (60 / bpm) / subdivision
    pub fn note_interval_seconds(&self) -> f64 {
        (60.0 / self.bpm) / self.subdivision as f64
    }

    /// Set tempo, returns true if it changed
    pub fn set_bpm(&mut self, bpm: f64) -> bool {
        let bpm = sanitize_bpm(bpm);
        let changed = bpm != self.bpm;
        self.bpm = bpm;
        changed
    }

    /// Set meter numerator and restore `muted_beats.len() == beats_per_bar`
    /// Returns true if the mute pattern had to be resized
    pub fn set_beats_per_bar(&mut self, beats_per_bar: u32) -> bool {
        self.beats_per_bar = sanitize_divisions(beats_per_bar);
        let len = self.beats_per_bar as usize;
        if self.muted_beats.len() != len {
            self.muted_beats = resize_muted_beats(&self.muted_beats, len);
            true
        } else {
            false
        }
    }

    /// Set note value; values outside NOTE_VALUES are rejected
    pub fn set_note_value(&mut self, note_value: u32) -> bool {
        if NOTE_VALUES.contains(&note_value) {
            self.note_value = note_value;
            true
        } else {
            log::warn!("Ignoring invalid note value {}", note_value);
            false
        }
    }

    pub fn set_subdivision(&mut self, subdivision: u32) {
        self.subdivision = sanitize_divisions(subdivision);
    }

    pub fn set_sound_preset(&mut self, sound_preset: SoundPreset) {
        self.sound_preset = sound_preset;
    }

    /// Replace the mute pattern (normalized to `beats_per_bar` entries)
    pub fn set_muted_beats(&mut self, muted: &[bool]) {
        self.muted_beats = resize_muted_beats(muted, self.beats_per_bar as usize);
    }

    /// Flip one mute flag; out-of-range indices are ignored
    pub fn toggle_mute(&mut self, index: usize) -> bool {
        if index >= self.muted_beats.len() {
            return false;
        }
        let mut muted = self.muted_beats.to_vec();
        muted[index] = !muted[index];
        self.muted_beats = muted.into();
        true
    }

    pub fn is_beat_muted(&self, main_beat_index: usize) -> bool {
        self.muted_beats
            .get(main_beat_index)
            .copied()
            .unwrap_or(false)
    }
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self::new(120.0, 4)
    }
}

impl fmt::Display for TempoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} BPM {}/{} x{} ({})",
            self.bpm, self.beats_per_bar, self.note_value, self.subdivision, self.sound_preset
        )
    }
}

/// Partial tempo configuration; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempoConfigUpdate {
    pub bpm: Option<f64>,
    pub beats_per_bar: Option<u32>,
    pub note_value: Option<u32>,
    pub subdivision: Option<u32>,
    pub sound_preset: Option<SoundPreset>,
    pub muted_beats: Option<Vec<bool>>,
}

impl TempoConfigUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TempoConfig::default();
        assert_eq!(config.bpm(), 120.0);
        assert_eq!(config.beats_per_bar(), 4);
        assert_eq!(config.note_value(), 4);
        assert_eq!(config.subdivision(), 1);
        assert_eq!(config.sound_preset(), SoundPreset::Beep);
        assert_eq!(&**config.muted_beats(), &[false; 4]);
    }

    #[test]
    fn test_note_interval() {
        let mut config = TempoConfig::new(120.0, 4);
        assert!((config.note_interval_seconds() - 0.5).abs() < 1e-12);

        config.set_subdivision(4);
        assert!((config.note_interval_seconds() - 0.125).abs() < 1e-12);
        assert_eq!(config.notes_per_bar(), 16);
    }

    #[test]
    fn test_bpm_guards() {
        let mut config = TempoConfig::default();

        config.set_bpm(0.0);
        assert_eq!(config.bpm(), MIN_BPM);

        config.set_bpm(-40.0);
        assert_eq!(config.bpm(), MIN_BPM);

        config.set_bpm(f64::NAN);
        assert_eq!(config.bpm(), MIN_BPM);

        config.set_bpm(1.0e9);
        assert_eq!(config.bpm(), MAX_BPM);

        assert!(config.note_interval_seconds().is_finite());
    }

    #[test]
    fn test_subdivision_zero_is_clamped() {
        let mut config = TempoConfig::default();
        config.set_subdivision(0);
        assert_eq!(config.subdivision(), 1);
        assert!(config.note_interval_seconds().is_finite());
    }

    #[test]
    fn test_grow_meter_preserves_mutes() {
        let mut config = TempoConfig::new(120.0, 4);
        config.set_muted_beats(&[true, false, true, true]);

        assert!(config.set_beats_per_bar(6));
        assert_eq!(
            &**config.muted_beats(),
            &[true, false, true, true, false, false]
        );
    }

    #[test]
    fn test_shrink_meter_discards_mutes() {
        let mut config = TempoConfig::new(120.0, 6);
        config.set_muted_beats(&[true, false, true, false, true, true]);

        assert!(config.set_beats_per_bar(3));
        assert_eq!(&**config.muted_beats(), &[true, false, true]);
    }

    #[test]
    fn test_same_meter_keeps_pattern() {
        let mut config = TempoConfig::new(120.0, 4);
        config.set_muted_beats(&[false, true, false, false]);
        let before = Arc::clone(config.muted_beats());

        assert!(!config.set_beats_per_bar(4));
        assert!(Arc::ptr_eq(&before, config.muted_beats()));
    }

    #[test]
    fn test_toggle_mute_replaces_pattern() {
        let mut config = TempoConfig::new(120.0, 4);
        let before = Arc::clone(config.muted_beats());

        assert!(config.toggle_mute(2));
        assert_eq!(&**config.muted_beats(), &[false, false, true, false]);
        // The old snapshot is untouched
        assert_eq!(&*before, &[false; 4]);

        assert!(!config.toggle_mute(4));
        assert!(!config.toggle_mute(usize::MAX));
    }

    #[test]
    fn test_set_muted_beats_normalizes_length() {
        let mut config = TempoConfig::new(120.0, 3);
        config.set_muted_beats(&[true]);
        assert_eq!(&**config.muted_beats(), &[true, false, false]);

        config.set_muted_beats(&[true, true, true, true, true]);
        assert_eq!(&**config.muted_beats(), &[true, true, true]);
    }

    #[test]
    fn test_note_value_validation() {
        let mut config = TempoConfig::default();
        assert!(config.set_note_value(8));
        assert_eq!(config.note_value(), 8);

        assert!(!config.set_note_value(3));
        assert_eq!(config.note_value(), 8);
    }

    #[test]
    fn test_sound_preset_parsing() {
        assert_eq!("beep".parse::<SoundPreset>(), Ok(SoundPreset::Beep));
        assert_eq!(" Woodblock ".parse::<SoundPreset>(), Ok(SoundPreset::Woodblock));
        assert!("cowbell".parse::<SoundPreset>().is_err());

        for preset in SoundPreset::ALL {
            assert_eq!(preset.to_string().parse::<SoundPreset>(), Ok(preset));
        }
    }

    #[test]
    fn test_sound_preset_serde_names() {
        let json = serde_json::to_string(&SoundPreset::Woodblock).unwrap();
        assert_eq!(json, "\"woodblock\"");
    }
}
