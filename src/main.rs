use mymusic_metronome::messaging::command::{Command, CommandError};
use mymusic_metronome::messaging::notification::StateChange;
use mymusic_metronome::practice::{PracticeTimer, TapTempo, TimerEvent};
use mymusic_metronome::sequencer::note_sequencer::main_beat_index;
use mymusic_metronome::{
    AudioOutput, EngineConfig, JsonFileStore, Metronome, MetronomeSettings, Preset, PresetStore,
    TempoConfig, TempoConfigUpdate, logger,
};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Console input is human paced: a handful of slots is plenty
const COMMAND_RINGBUFFER_CAPACITY: usize = 64;
// Console loop period (~60 Hz, like a UI frame)
const CONSOLE_TICK: Duration = Duration::from_millis(16);

fn main() {
    println!("=== MyMusic Metronome ===");
    println!("Type 'help' for the list of commands\n");

    let engine_config = match EngineConfig::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid engine configuration, using defaults: {}", e);
            EngineConfig::default()
        }
    };
    logger::init(engine_config.log_level());

    let store = match JsonFileStore::open_default() {
        Ok(store) => Some(store),
        Err(e) => {
            log::warn!("Presets disabled: {}", e);
            None
        }
    };

    let mut audio = match AudioOutput::new(&engine_config) {
        Ok(audio) => audio,
        Err(e) => {
            log::error!("Audio output unavailable: {}", e);
            return;
        }
    };
    let Some(renderer) = audio.take_renderer() else {
        log::error!("Audio renderer already taken");
        return;
    };

    let mut metronome = Metronome::new(
        Arc::new(audio.clock()),
        Box::new(renderer),
        TempoConfig::default(),
        &engine_config,
    );
    let mut state_rx = metronome.subscribe();

    if let Some(store) = &store {
        match store.load_settings() {
            Ok(Some(settings)) => metronome.configure(settings.into()),
            Ok(None) => {}
            Err(e) => log::warn!("Could not restore settings: {}", e),
        }
    }
    println!("{}", metronome.config());

    let (command_tx, mut command_rx) = HeapRb::<Command>::new(COMMAND_RINGBUFFER_CAPACITY).split();
    if let Err(e) = spawn_console_reader(command_tx) {
        log::error!("Failed to start console reader: {}", e);
        return;
    }

    let mut console = Console {
        metronome: &mut metronome,
        store: store.as_ref(),
        tap_tempo: TapTempo::new(),
        timer: None,
    };

    let mut last_tick = Instant::now();
    'running: loop {
        while let Some(command) = command_rx.try_pop() {
            if !console.handle(command) {
                break 'running;
            }
        }

        console.show_beats();

        while let Some(change) = state_rx.try_pop() {
            println!("{}", describe(&change));
        }

        let now = Instant::now();
        console.tick_timer(now - last_tick);
        last_tick = now;

        thread::sleep(CONSOLE_TICK);
    }

    metronome.stop();
    if let Some(store) = &store
        && let Err(e) = store.save_settings(&MetronomeSettings::from(&metronome.config()))
    {
        log::error!("Could not save settings: {}", e);
    }
    println!("\nBye!");
}

/// Read stdin lines on a dedicated thread and forward parsed commands
fn spawn_console_reader(mut command_tx: HeapProd<Command>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if command_tx.try_push(command).is_err() {
                            log::warn!("Command queue full, dropping '{}'", line.trim());
                        }
                    }
                    Err(CommandError::Empty) => {}
                    Err(e) => eprintln!("{}", e),
                }
            }
            // quit or EOF: the console loop must see it
            push_until_accepted(&mut command_tx, Command::Quit);
        })?;
    Ok(())
}

/// Push `command`, waiting for the console loop to free a slot
fn push_until_accepted(command_tx: &mut HeapProd<Command>, mut command: Command) {
    while let Err(rejected) = command_tx.try_push(command) {
        command = rejected;
        thread::sleep(CONSOLE_TICK);
    }
}

struct Console<'a> {
    metronome: &'a mut Metronome,
    store: Option<&'a JsonFileStore>,
    tap_tempo: TapTempo,
    timer: Option<PracticeTimer>,
}

impl Console<'_> {
    /// Returns false on quit
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Play => match self.metronome.start() {
                Ok(()) => {
                    if let Some(timer) = &mut self.timer {
                        timer.start();
                    }
                }
                Err(e) => log::error!("Cannot start: {}", e),
            },
            Command::Stop => {
                self.metronome.stop();
                if let Some(timer) = &mut self.timer {
                    timer.pause();
                }
            }
            Command::SetBpm(bpm) => self.metronome.set_bpm(bpm),
            Command::SetBeatsPerBar(beats) => self.metronome.configure(TempoConfigUpdate {
                beats_per_bar: Some(beats),
                ..Default::default()
            }),
            Command::SetNoteValue(value) => self.metronome.configure(TempoConfigUpdate {
                note_value: Some(value),
                ..Default::default()
            }),
            Command::SetSubdivision(subdivision) => self.metronome.configure(TempoConfigUpdate {
                subdivision: Some(subdivision),
                ..Default::default()
            }),
            Command::SetSound(preset) => self.metronome.configure(TempoConfigUpdate {
                sound_preset: Some(preset),
                ..Default::default()
            }),
            Command::ToggleMute(index) => self.metronome.toggle_mute(index),
            Command::Tap => match self.tap_tempo.tap() {
                Some(bpm) => self.metronome.set_bpm(bpm),
                None => println!("tap ({})", self.tap_tempo.tap_count()),
            },
            Command::EnableTrainer(settings) => self.metronome.enable_speed_trainer(settings),
            Command::DisableTrainer => {
                self.metronome.disable_speed_trainer();
                println!("Speed trainer off");
            }
            Command::StartTimer(minutes) => {
                let mut timer = PracticeTimer::from_minutes(minutes);
                if self.metronome.is_playing() {
                    timer.start();
                }
                println!("Practice timer: {}", timer);
                self.timer = Some(timer);
            }
            Command::SavePreset(name) => self.save_preset(name),
            Command::LoadPreset(name) => self.load_preset(&name),
            Command::DeletePreset(name) => self.delete_preset(&name),
            Command::ListPresets => self.list_presets(),
            Command::Help => println!("{}", Command::USAGE),
            Command::Quit => return false,
        }
        true
    }

    fn save_preset(&self, name: String) {
        let Some(store) = self.store else {
            println!("No preset storage available");
            return;
        };
        let settings = MetronomeSettings::from(&self.metronome.config());
        let result = store.find_preset(&name).and_then(|existing| {
            let preset = match existing {
                Some(preset) => Preset { settings, ..preset },
                None => Preset::new(name, settings),
            };
            store.save_preset(&preset).map(|()| preset)
        });
        match result {
            Ok(preset) => println!("Saved preset '{}'", preset.name),
            Err(e) => log::error!("Could not save preset: {}", e),
        }
    }

    fn load_preset(&self, name: &str) {
        let Some(store) = self.store else {
            println!("No preset storage available");
            return;
        };
        match store.find_preset(name) {
            Ok(Some(preset)) => {
                self.metronome.configure(preset.settings.into());
                println!("Loaded preset '{}'", preset.name);
            }
            Ok(None) => println!("No preset named '{}'", name),
            Err(e) => log::error!("Could not load presets: {}", e),
        }
    }

    fn delete_preset(&self, name: &str) {
        let Some(store) = self.store else {
            println!("No preset storage available");
            return;
        };
        let result = store.find_preset(name).and_then(|found| match found {
            Some(preset) => store.delete_preset(&preset.id).map(|deleted| deleted.then_some(preset)),
            None => Ok(None),
        });
        match result {
            Ok(Some(preset)) => println!("Deleted preset '{}'", preset.name),
            Ok(None) => println!("No preset named '{}'", name),
            Err(e) => log::error!("Could not delete preset: {}", e),
        }
    }

    fn list_presets(&self) {
        let Some(store) = self.store else {
            println!("No preset storage available");
            return;
        };
        match store.presets() {
            Ok(presets) if presets.is_empty() => println!("No presets saved"),
            Ok(presets) => {
                for preset in presets {
                    let settings = preset.settings;
                    println!(
                        "  {:<20} {:>6.1} BPM {}/{} x{} {}",
                        preset.name,
                        settings.bpm,
                        settings.beats_per_bar,
                        settings.note_value,
                        settings.subdivision,
                        settings.sound_preset
                    );
                }
            }
            Err(e) => log::error!("Could not load presets: {}", e),
        }
    }

    /// Print the main beat of every note that became due
    fn show_beats(&self) {
        let notes = self.metronome.poll_now();
        let Some(note) = notes.last() else {
            return;
        };
        let config = self.metronome.config();
        let beat = main_beat_index(note.beat, config.subdivision());
        let marker = if config.is_beat_muted(beat) { '-' } else { '*' };
        print!("\r{} {:>2}/{} ", marker, beat + 1, config.beats_per_bar());
        let _ = std::io::stdout().flush();
    }

    fn tick_timer(&mut self, elapsed: Duration) {
        let Some(timer) = &mut self.timer else {
            return;
        };
        if timer.tick(elapsed) == TimerEvent::Expired {
            self.metronome.stop();
            println!("\nPractice timer finished");
            self.timer = None;
        }
    }
}

fn describe(change: &StateChange) -> String {
    let mut parts = Vec::new();
    if let Some(playing) = change.is_playing {
        parts.push(if playing { "playing".to_string() } else { "stopped".to_string() });
    }
    if let Some(bpm) = change.bpm {
        parts.push(format!("{:.1} BPM", bpm));
    }
    if let Some(beats) = change.beats_per_bar {
        parts.push(format!("{} beats per bar", beats));
    }
    if let Some(value) = change.note_value {
        parts.push(format!("note value 1/{}", value));
    }
    if let Some(subdivision) = change.subdivision {
        parts.push(format!("subdivision x{}", subdivision));
    }
    if let Some(preset) = change.sound_preset {
        parts.push(format!("sound {}", preset));
    }
    if let Some(muted) = &change.muted_beats {
        let pattern: String = muted.iter().map(|&m| if m { '-' } else { '*' }).collect();
        parts.push(format!("mutes [{}]", pattern));
    }
    format!("\n{}", parts.join(", "))
}
