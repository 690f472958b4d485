// Metronome sounds - pre-generated click tables and a sample-accurate player
// The player lives in the audio callback: no allocation after construction

use crate::sequencer::config::SoundPreset;
use ringbuf::traits::Consumer;
use std::f32::consts::PI;

/// Oscillator shape of a timbre
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Sine,
    Square,
}

/// Synthesis parameters of one timbre (accent, regular)
#[derive(Debug, Clone, Copy)]
struct Voicing {
    shape: Shape,
    frequency: (f32, f32),
    gain: (f32, f32),
    duration_secs: f32,
}

impl Voicing {
    fn of(preset: SoundPreset) -> Self {
        match preset {
            SoundPreset::Beep => Self {
                shape: Shape::Sine,
                frequency: (1200.0, 800.0),
                gain: (1.0, 0.7),
                duration_secs: 0.1,
            },
            SoundPreset::Click => Self {
                shape: Shape::Square,
                frequency: (1500.0, 1000.0),
                gain: (0.5, 0.3),
                duration_secs: 0.05,
            },
            SoundPreset::Woodblock => Self {
                shape: Shape::Sine,
                frequency: (1000.0, 800.0),
                gain: (1.0, 0.7),
                duration_secs: 0.05,
            },
        }
    }
}

/// Level the exponential decay reaches at the end of a click
const DECAY_FLOOR: f32 = 0.001;

/// Pre-generated samples for every (preset, accent) pair
#[derive(Debug, Clone)]
pub struct ClickBank {
    tables: Vec<Vec<f32>>,
}

impl ClickBank {
    pub fn new(sample_rate: f32) -> Self {
        let mut tables = Vec::with_capacity(SoundPreset::ALL.len() * 2);
        for preset in SoundPreset::ALL {
            for accent in [true, false] {
                tables.push(Self::generate(sample_rate, Voicing::of(preset), accent));
            }
        }
        Self { tables }
    }

    /// Oscillator with an exponential gain ramp from `gain` down to DECAY_FLOOR
    fn generate(sample_rate: f32, voicing: Voicing, accent: bool) -> Vec<f32> {
        let (frequency, gain) = if accent {
            (voicing.frequency.0, voicing.gain.0)
        } else {
            (voicing.frequency.1, voicing.gain.1)
        };
        let num_samples = (voicing.duration_secs * sample_rate) as usize;
        let phase_increment = 2.0 * PI * frequency / sample_rate;
        let decay_ratio = DECAY_FLOOR / gain;

        (0..num_samples)
            .map(|i| {
                let t = i as f32 / num_samples as f32;
                let envelope = gain * decay_ratio.powf(t);
                let phase = i as f32 * phase_increment;
                let wave = match voicing.shape {
                    Shape::Sine => phase.sin(),
                    Shape::Square => {
                        if phase.sin() >= 0.0 {
                            1.0
                        } else {
                            -1.0
                        }
                    }
                };
                wave * envelope
            })
            .collect()
    }

    fn index(preset: SoundPreset, accent: bool) -> usize {
        let preset_index = match preset {
            SoundPreset::Beep => 0,
            SoundPreset::Click => 1,
            SoundPreset::Woodblock => 2,
        };
        preset_index * 2 + usize::from(!accent)
    }

    /// Samples of one click
    pub fn get_click(&self, preset: SoundPreset, accent: bool) -> &[f32] {
        &self.tables[Self::index(preset, accent)]
    }
}

/// Click request sent from the scheduler to the audio callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    /// Absolute sample index at which the click starts
    pub start_sample: u64,
    pub timbre: SoundPreset,
    pub accent: bool,
}

/// Active click playback state
#[derive(Debug, Clone, Copy)]
struct ClickVoice {
    table: usize,
    position: usize,
}

/// Mixes scheduled clicks into the output at their exact start sample
#[derive(Debug, Clone)]
pub struct ClickPlayer {
    bank: ClickBank,
    pending: Vec<ClickEvent>,
    voices: Vec<ClickVoice>,
    volume: f32,
}

impl ClickPlayer {
    /// Maximum number of clicks waiting for their start sample
    ///
    /// Covers the densest stream the tempo clamps allow (1000 BPM x 64, about
    /// 1067 notes/s) over a 0.1 s window plus the same again of margin.
    pub const MAX_PENDING: usize = 256;
    /// Maximum number of overlapping clicks
    pub const MAX_VOICES: usize = 8;

    pub fn new(sample_rate: f32, volume: f32) -> Self {
        Self {
            bank: ClickBank::new(sample_rate),
            pending: Vec::with_capacity(Self::MAX_PENDING),
            voices: Vec::with_capacity(Self::MAX_VOICES),
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Queue a click; returns false if the pending list is full
    pub fn schedule(&mut self, event: ClickEvent) -> bool {
        if self.pending.len() >= Self::MAX_PENDING {
            return false;
        }
        self.pending.push(event);
        true
    }

    pub fn is_full(&self) -> bool {
        self.pending.len() >= Self::MAX_PENDING
    }

    /// Move clicks from `source` until it is empty or the pending list is full
    ///
    /// Clicks that do not fit stay in `source` for the next call.
    pub fn drain_from<C>(&mut self, source: &mut C) -> usize
    where
        C: Consumer<Item = ClickEvent>,
    {
        let mut moved = 0;
        while !self.is_full() {
            let Some(event) = source.try_pop() else {
                break;
            };
            self.pending.push(event);
            moved += 1;
        }
        moved
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Produce the output sample for absolute sample index `sample_index`
    /// Clicks whose start is at or before this index start now (late ones included)
    pub fn next_sample(&mut self, sample_index: u64) -> f32 {
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].start_sample <= sample_index {
                let event = self.pending.swap_remove(i);
                self.start_voice(event);
            } else {
                i += 1;
            }
        }

        let mut output = 0.0;
        let bank = &self.bank;
        self.voices.retain_mut(|voice| {
            let table = &bank.tables[voice.table];
            match table.get(voice.position) {
                Some(&sample) => {
                    output += sample;
                    voice.position += 1;
                    true
                }
                None => false,
            }
        });

        output * self.volume
    }

    fn start_voice(&mut self, event: ClickEvent) {
        let voice = ClickVoice {
            table: ClickBank::index(event.timbre, event.accent),
            position: 0,
        };
        if self.voices.len() >= Self::MAX_VOICES {
            // Steal the oldest voice
            self.voices.remove(0);
        }
        self.voices.push(voice);
    }

    /// Drop everything pending and playing
    pub fn reset(&mut self) {
        self.pending.clear();
        self.voices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    #[test]
    fn test_click_durations() {
        let bank = ClickBank::new(48000.0);

        // 100ms at 48kHz
        assert_eq!(bank.get_click(SoundPreset::Beep, true).len(), 4800);
        // 50ms at 48kHz
        assert_eq!(bank.get_click(SoundPreset::Click, false).len(), 2400);
        assert_eq!(bank.get_click(SoundPreset::Woodblock, true).len(), 2400);
    }

    #[test]
    fn test_accent_is_louder() {
        let bank = ClickBank::new(48000.0);
        for preset in SoundPreset::ALL {
            let accent = peak(bank.get_click(preset, true));
            let regular = peak(bank.get_click(preset, false));
            assert!(accent > regular, "{preset}: {accent} <= {regular}");
        }
    }

    #[test]
    fn test_click_decays() {
        let bank = ClickBank::new(48000.0);
        let click = bank.get_click(SoundPreset::Beep, true);
        let head = peak(&click[..480]);
        let tail = peak(&click[click.len() - 480..]);
        assert!(head > 0.5);
        assert!(tail < 0.01);
    }

    #[test]
    fn test_player_starts_on_exact_sample() {
        let mut player = ClickPlayer::new(48000.0, 1.0);
        assert!(player.schedule(ClickEvent {
            start_sample: 100,
            timbre: SoundPreset::Click,
            accent: true,
        }));

        for index in 0..100 {
            assert_eq!(player.next_sample(index), 0.0);
        }
        // Square wave: first sample is at full gain
        assert!(player.next_sample(100).abs() > 0.4);
        assert_eq!(player.active_voices(), 1);
        assert_eq!(player.pending_len(), 0);
    }

    #[test]
    fn test_late_click_starts_immediately() {
        let mut player = ClickPlayer::new(48000.0, 1.0);
        player.schedule(ClickEvent {
            start_sample: 10,
            timbre: SoundPreset::Click,
            accent: false,
        });
        assert!(player.next_sample(5000).abs() > 0.0);
    }

    #[test]
    fn test_player_goes_silent_after_click() {
        let mut player = ClickPlayer::new(48000.0, 0.5);
        player.schedule(ClickEvent {
            start_sample: 0,
            timbre: SoundPreset::Woodblock,
            accent: false,
        });

        let mut index = 0;
        while index < 2400 {
            player.next_sample(index);
            index += 1;
        }
        assert_eq!(player.next_sample(index), 0.0);
        assert_eq!(player.active_voices(), 0);
    }

    #[test]
    fn test_volume_scales_output() {
        let event = ClickEvent {
            start_sample: 0,
            timbre: SoundPreset::Click,
            accent: true,
        };

        let mut full = ClickPlayer::new(48000.0, 1.0);
        full.schedule(event);
        let mut half = ClickPlayer::new(48000.0, 0.5);
        half.schedule(event);

        let a = full.next_sample(0);
        let b = half.next_sample(0);
        assert!((a - 2.0 * b).abs() < 1e-6);
    }

    #[test]
    fn test_pending_and_voice_limits() {
        let mut player = ClickPlayer::new(48000.0, 1.0);
        for i in 0..ClickPlayer::MAX_PENDING {
            assert!(player.schedule(ClickEvent {
                start_sample: i as u64,
                timbre: SoundPreset::Beep,
                accent: false,
            }));
        }
        assert!(player.is_full());
        assert!(!player.schedule(ClickEvent {
            start_sample: 0,
            timbre: SoundPreset::Beep,
            accent: false,
        }));

        player.next_sample(1000);
        assert_eq!(player.active_voices(), ClickPlayer::MAX_VOICES);

        player.reset();
        assert_eq!(player.active_voices(), 0);
        assert_eq!(player.pending_len(), 0);
    }

    #[test]
    fn test_drain_leaves_overflow_in_source() {
        use ringbuf::HeapRb;
        use ringbuf::traits::{Observer, Producer, Split};

        let total = ClickPlayer::MAX_PENDING + 40;
        let (mut tx, mut rx) = HeapRb::<ClickEvent>::new(total).split();
        for i in 0..total {
            let pushed = tx.try_push(ClickEvent {
                start_sample: 100 + i as u64,
                timbre: SoundPreset::Click,
                accent: false,
            });
            assert!(pushed.is_ok());
        }

        let mut player = ClickPlayer::new(48000.0, 1.0);
        assert_eq!(player.drain_from(&mut rx), ClickPlayer::MAX_PENDING);
        assert!(player.is_full());
        assert_eq!(rx.occupied_len(), 40);

        // Nothing is lost: once clicks start, the rest come out of the ring
        let mut moved = ClickPlayer::MAX_PENDING;
        let mut index = 0u64;
        while !rx.is_empty() {
            for _ in 0..64 {
                player.next_sample(index);
                index += 1;
            }
            moved += player.drain_from(&mut rx);
        }
        assert_eq!(moved, total);
    }
}
