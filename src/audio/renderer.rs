// Sound renderer - outbound interface from the scheduler to whatever makes the sound

use crate::sequencer::config::SoundPreset;

/// Renders one timbre at a precise clock time
///
/// Fire-and-forget: `time` is the scheduled clock time of the note (usually in
/// the near future), never "now". Implementations must not block.
pub trait SoundRenderer: Send {
    fn render(&mut self, time: f64, timbre: SoundPreset, is_accent: bool);
}

/// Renderer that discards everything (headless runs, visual-only sync)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl SoundRenderer for NullRenderer {
    fn render(&mut self, _time: f64, _timbre: SoundPreset, _is_accent: bool) {}
}

impl<F> SoundRenderer for F
where
    F: FnMut(f64, SoundPreset, bool) + Send,
{
    fn render(&mut self, time: f64, timbre: SoundPreset, is_accent: bool) {
        self(time, timbre, is_accent)
    }
}
