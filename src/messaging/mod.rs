// Messaging - state change notifications and console commands

pub mod channels;
pub mod command;
pub mod notification;

pub use channels::{BeatConsumer, Broadcaster, StateChangeConsumer};
pub use command::{Command, CommandError};
pub use notification::StateChange;
