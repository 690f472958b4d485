// Console commands - line based control of the metronome

use crate::sequencer::config::SoundPreset;
use crate::sequencer::speed_trainer::SpeedTrainerSettings;
use std::str::FromStr;

/// Command parsing errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error("Invalid argument for '{command}': {value}")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },

    #[error("Too many arguments for '{0}'")]
    TooManyArguments(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Stop,
    SetBpm(f64),
    SetBeatsPerBar(u32),
    SetNoteValue(u32),
    SetSubdivision(u32),
    SetSound(SoundPreset),
    /// Zero-based main beat index
    ToggleMute(usize),
    Tap,
    EnableTrainer(SpeedTrainerSettings),
    DisableTrainer,
    /// Practice timer duration in minutes
    StartTimer(u32),
    SavePreset(String),
    LoadPreset(String),
    DeletePreset(String),
    ListPresets,
    Help,
    Quit,
}

impl Command {
    /// Usage text printed by `help`
    pub const USAGE: &'static str = "\
play | stop
bpm <n> | meter <beats> | note <value> | sub <n>
sound <beep|click|woodblock>
mute <beat>            (1-based)
tap
trainer <start> <end> <increment> <bars> | trainer off
timer <minutes>
save <name> | load <name> | delete <name> | presets
help | quit";

    /// Parse one console line
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let keyword = words.next().ok_or(CommandError::Empty)?.to_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match keyword.as_str() {
            "play" | "start" => no_args("play", &args, Command::Play)?,
            "stop" => no_args("stop", &args, Command::Stop)?,
            "bpm" => Command::SetBpm(single("bpm", &args)?),
            "meter" => Command::SetBeatsPerBar(single("meter", &args)?),
            "note" => Command::SetNoteValue(single("note", &args)?),
            "sub" => Command::SetSubdivision(single("sub", &args)?),
            "sound" => Command::SetSound(single("sound", &args)?),
            "mute" => {
                let beat: usize = single("mute", &args)?;
                if beat == 0 {
                    return Err(CommandError::InvalidArgument {
                        command: "mute",
                        value: "0".to_string(),
                    });
                }
                Command::ToggleMute(beat - 1)
            }
            "tap" => no_args("tap", &args, Command::Tap)?,
            "trainer" => parse_trainer(&args)?,
            "timer" => Command::StartTimer(single("timer", &args)?),
            "save" => Command::SavePreset(name("save", &args)?),
            "load" => Command::LoadPreset(name("load", &args)?),
            "delete" => Command::DeletePreset(name("delete", &args)?),
            "presets" => no_args("presets", &args, Command::ListPresets)?,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(command)
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn no_args(command: &'static str, args: &[&str], value: Command) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(value)
    } else {
        Err(CommandError::TooManyArguments(command))
    }
}

fn argument<T: FromStr>(command: &'static str, arg: &str) -> Result<T, CommandError> {
    arg.parse().map_err(|_| CommandError::InvalidArgument {
        command,
        value: arg.to_string(),
    })
}

fn single<T: FromStr>(command: &'static str, args: &[&str]) -> Result<T, CommandError> {
    match args {
        [] => Err(CommandError::MissingArgument(command)),
        [arg] => argument(command, arg),
        _ => Err(CommandError::TooManyArguments(command)),
    }
}

/// Preset names may contain spaces
fn name(command: &'static str, args: &[&str]) -> Result<String, CommandError> {
    if args.is_empty() {
        Err(CommandError::MissingArgument(command))
    } else {
        Ok(args.join(" "))
    }
}

fn parse_trainer(args: &[&str]) -> Result<Command, CommandError> {
    match args {
        [] => Err(CommandError::MissingArgument("trainer")),
        [off] if off.eq_ignore_ascii_case("off") => Ok(Command::DisableTrainer),
        [start, end, increment, interval] => Ok(Command::EnableTrainer(
            SpeedTrainerSettings::new(
                argument("trainer", start)?,
                argument("trainer", end)?,
                argument("trainer", increment)?,
                argument("trainer", interval)?,
            ),
        )),
        [_, _, _, _, ..] => Err(CommandError::TooManyArguments("trainer")),
        _ => Err(CommandError::MissingArgument("trainer")),
    }
}
