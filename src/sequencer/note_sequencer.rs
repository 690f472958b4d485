// Note sequencer - decides how a due beat is rendered
// Pure function of (beat index, meter, subdivision, mute pattern, sound preset)

use super::config::{SoundPreset, TempoConfig};

/// Position of a beat inside the bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatKind {
    /// First beat of the bar (accent/downbeat)
    Accent,
    /// Other main beats
    Main,
    /// Sub-pulse between main beats
    Subdivision,
}

/// What the sound renderer should do for a due beat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    /// Muted beat: recorded and reported, but not rendered
    Silent,
    Play { timbre: SoundPreset, accent: bool },
}

/// Timbre used for subdivision ticks, whatever the configured preset
pub const SUBDIVISION_TIMBRE: SoundPreset = SoundPreset::Click;

/// Classify a beat index of the bar
pub fn beat_kind(beat: u32, subdivision: u32) -> BeatKind {
    let subdivision = subdivision.max(1);
    if beat == 0 {
        BeatKind::Accent
    } else if beat % subdivision == 0 {
        BeatKind::Main
    } else {
        BeatKind::Subdivision
    }
}

/// Index of the main beat a (sub)beat belongs to
pub fn main_beat_index(beat: u32, subdivision: u32) -> usize {
    (beat / subdivision.max(1)) as usize
}

/// Decide how to render `beat` under `config`
pub fn sequence_note(beat: u32, config: &TempoConfig) -> NoteAction {
    let subdivision = config.subdivision();

    if config.is_beat_muted(main_beat_index(beat, subdivision)) {
        return NoteAction::Silent;
    }

    match beat_kind(beat, subdivision) {
        BeatKind::Accent => NoteAction::Play {
            timbre: config.sound_preset(),
            accent: true,
        },
        BeatKind::Main => NoteAction::Play {
            timbre: config.sound_preset(),
            accent: false,
        },
        // Subdivisions stay audibly distinct from main beats under every preset
        BeatKind::Subdivision => NoteAction::Play {
            timbre: SUBDIVISION_TIMBRE,
            accent: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(beats: u32, subdivision: u32, preset: SoundPreset) -> TempoConfig {
        let mut config = TempoConfig::new(120.0, beats);
        config.set_subdivision(subdivision);
        config.set_sound_preset(preset);
        config
    }

    #[test]
    fn test_beat_kinds() {
        assert_eq!(beat_kind(0, 1), BeatKind::Accent);
        assert_eq!(beat_kind(1, 1), BeatKind::Main);
        assert_eq!(beat_kind(1, 2), BeatKind::Subdivision);
        assert_eq!(beat_kind(2, 2), BeatKind::Main);
        assert_eq!(beat_kind(7, 4), BeatKind::Subdivision);
        // Zero subdivision is treated as 1
        assert_eq!(beat_kind(3, 0), BeatKind::Main);
    }

    #[test]
    fn test_main_beat_index() {
        assert_eq!(main_beat_index(0, 4), 0);
        assert_eq!(main_beat_index(3, 4), 0);
        assert_eq!(main_beat_index(4, 4), 1);
        assert_eq!(main_beat_index(5, 0), 5);
    }

    #[test]
    fn test_accent_pattern_4_4() {
        let config = config(4, 1, SoundPreset::Woodblock);

        assert_eq!(
            sequence_note(0, &config),
            NoteAction::Play {
                timbre: SoundPreset::Woodblock,
                accent: true
            }
        );
        for beat in 1..4 {
            assert_eq!(
                sequence_note(beat, &config),
                NoteAction::Play {
                    timbre: SoundPreset::Woodblock,
                    accent: false
                }
            );
        }
    }

    #[test]
    fn test_subdivisions_use_soft_click() {
        for preset in SoundPreset::ALL {
            let config = config(4, 2, preset);
            assert_eq!(
                sequence_note(1, &config),
                NoteAction::Play {
                    timbre: SoundPreset::Click,
                    accent: false
                }
            );
            assert_eq!(
                sequence_note(2, &config),
                NoteAction::Play {
                    timbre: preset,
                    accent: false
                }
            );
        }
    }

    #[test]
    fn test_muted_main_beat_silences_its_subdivisions() {
        let mut config = config(4, 3, SoundPreset::Beep);
        config.set_muted_beats(&[false, true, false, false]);

        // Main beat 1 covers sub-beats 3, 4, 5
        for beat in 3..6 {
            assert_eq!(sequence_note(beat, &config), NoteAction::Silent);
        }
        assert_ne!(sequence_note(2, &config), NoteAction::Silent);
        assert_ne!(sequence_note(6, &config), NoteAction::Silent);
    }

    #[test]
    fn test_muted_downbeat_is_silent() {
        let mut config = config(3, 1, SoundPreset::Beep);
        config.set_muted_beats(&[true, false, false]);
        assert_eq!(sequence_note(0, &config), NoteAction::Silent);
    }

    #[test]
    fn test_beat_beyond_pattern_is_not_muted() {
        let mut config = config(2, 1, SoundPreset::Beep);
        config.set_muted_beats(&[true, true]);
        assert_ne!(sequence_note(5, &config), NoteAction::Silent);
    }
}
