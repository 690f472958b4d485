// Module audio - clock sources, click synthesis and the cpal output stream

pub mod clock;
pub mod engine;
pub mod renderer;
pub mod sound;
pub mod timing;

pub use clock::{Clock, ClockError, ManualClock, SystemClock};
pub use engine::{AudioError, AudioOutput, StreamClock, StreamRenderer};
pub use renderer::{NullRenderer, SoundRenderer};
