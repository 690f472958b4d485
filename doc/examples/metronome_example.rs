// Example: Driving the scheduler without an audio device
// Steps a manual clock the way the lookahead thread does and prints what
// would be heard, including a speed trainer ramp.
//
// Run with: cargo run --example metronome_example

use mymusic_metronome::audio::clock::{Clock, ManualClock};
use mymusic_metronome::config::EngineConfig;
use mymusic_metronome::sequencer::note_sequencer::main_beat_index;
use mymusic_metronome::sequencer::{Scheduler, SoundPreset, SpeedTrainerSettings, TempoConfig};
use ringbuf::traits::Consumer;

fn main() {
    let engine_config = EngineConfig::default();
    let clock = ManualClock::new();

    let mut config = TempoConfig::new(100.0, 4);
    config.set_subdivision(2);
    config.set_muted_beats(&[false, false, true, false]);

    let renderer = |time: f64, timbre: SoundPreset, accent: bool| {
        let kind = if accent { "ACCENT" } else { "click" };
        println!("  {:>8.3}s  {:<6} {}", time, kind, timbre);
    };
    let mut scheduler = Scheduler::new(config, Box::new(renderer), &engine_config);
    let mut state_rx = scheduler.subscribe(64);

    println!("{}, beat 3 muted, trainer 100 -> 110 BPM every bar\n", scheduler.config());
    scheduler.enable_speed_trainer(SpeedTrainerSettings::new(100.0, 110.0, 5.0, 1));
    scheduler.begin(clock.now());

    let step = engine_config.lookahead_interval().as_secs_f64();
    while scheduler.cursor().bars_played < 3 {
        scheduler.step(clock.now());

        for note in scheduler.poll(clock.now()) {
            let beat = main_beat_index(note.beat, scheduler.config().subdivision());
            if note.beat % scheduler.config().subdivision() == 0 {
                println!("  -> beat {} due at {:.3}s", beat + 1, note.time);
            }
        }
        while let Some(change) = state_rx.try_pop() {
            if let Some(bpm) = change.bpm {
                println!("  == tempo now {:.1} BPM", bpm);
            }
        }

        clock.advance(step);
    }

    scheduler.halt();
    println!("\nStopped after {} bars", scheduler.cursor().bars_played);
}
