// Practice helpers - tap tempo and countdown timer

pub mod tap_tempo;
pub mod timer;

pub use tap_tempo::TapTempo;
pub use timer::{PracticeTimer, TimerEvent};
