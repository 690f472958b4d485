// Audio output - cpal stream rendering metronome clicks
//
// # Format Support
//
// The device's preferred sample format is detected with `sample_format()`;
// F32, I16 and U16 streams are supported. Clicks are mixed in f32 and converted
// when written to the output buffer (no allocation in the callback).
//
// # Clock
//
// The stream doubles as the scheduler's clock: time is the number of frames
// rendered so far divided by the sample rate. It only advances while the
// device is actually pulling audio, which is what makes `resume()` meaningful
// on hosts that start streams lazily.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::clock::{Clock, ClockError};
use crate::audio::renderer::SoundRenderer;
use crate::audio::sound::{ClickEvent, ClickPlayer};
use crate::audio::timing::AudioTiming;
use crate::config::EngineConfig;
use crate::sequencer::config::SoundPreset;

/// Audio output error types
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported sample format: {0}. Supported formats: F32, I16, U16")]
    UnsupportedFormat(String),

    #[error("Error in stream creation: {0}")]
    Build(String),

    #[error("Failed to start stream: {0}")]
    Play(String),
}

/// Default output device playing scheduled clicks
pub struct AudioOutput {
    _device: Device,
    _stream: Stream,
    timing: AudioTiming,
    active: Arc<AtomicBool>,
    resume_timeout: Duration,
    click_tx: Option<HeapProd<ClickEvent>>,
}

impl AudioOutput {
    pub fn new(engine_config: &EngineConfig) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| AudioError::Config(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        log::debug!("Audio config: {:?}", supported_config);

        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let timing = AudioTiming::new(sample_rate);
        let active = Arc::new(AtomicBool::new(false));
        let player = ClickPlayer::new(sample_rate, engine_config.volume());
        let (click_tx, click_rx) =
            HeapRb::<ClickEvent>::new(engine_config.click_queue_capacity.max(1)).split();

        let parts = CallbackParts {
            channels,
            timing: timing.clone(),
            active: Arc::clone(&active),
            player,
            click_rx,
        };

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, parts),
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, parts),
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, parts),
            other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream
            .play()
            .map_err(|e| AudioError::Play(e.to_string()))?;

        Ok(Self {
            _device: device,
            _stream: stream,
            timing,
            active,
            resume_timeout: engine_config.resume_timeout(),
            click_tx: Some(click_tx),
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.timing.sample_rate()
    }

    /// Clock driven by this stream
    pub fn clock(&self) -> StreamClock {
        StreamClock {
            timing: self.timing.clone(),
            active: Arc::clone(&self.active),
            resume_timeout: self.resume_timeout,
        }
    }

    /// Renderer feeding this stream (only one per output)
    pub fn take_renderer(&mut self) -> Option<StreamRenderer> {
        self.click_tx.take().map(|click_tx| StreamRenderer {
            timing: self.timing.clone(),
            click_tx,
            overflowed: false,
        })
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        parts: CallbackParts,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let CallbackParts {
            channels,
            timing,
            active,
            mut player,
            mut click_rx,
        } = parts;
        let error_active = Arc::clone(&active);

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // No allocations, no I/O, no locks in here
                    // Clicks that do not fit wait in the ring
                    player.drain_from(&mut click_rx);

                    let start = timing.current_sample();
                    let mut frames = 0;
                    for frame in data.chunks_mut(channels) {
                        let sample = player.next_sample(start + frames as u64);
                        for channel_sample in frame.iter_mut() {
                            *channel_sample = T::from_sample(sample);
                        }
                        frames += 1;
                    }

                    timing.advance(frames);
                    active.store(true, Ordering::Release);
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                    error_active.store(false, Ordering::Release);
                },
                None,
            )
            .map_err(|e| AudioError::Build(e.to_string()))
    }
}

impl std::fmt::Debug for AudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioOutput")
            .field("sample_rate", &self.sample_rate())
            .field("active", &self.active.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

/// Everything the audio callback owns
struct CallbackParts {
    channels: usize,
    timing: AudioTiming,
    active: Arc<AtomicBool>,
    player: ClickPlayer,
    click_rx: HeapCons<ClickEvent>,
}

/// Clock reading the stream's rendered frame count
#[derive(Debug, Clone)]
pub struct StreamClock {
    timing: AudioTiming,
    active: Arc<AtomicBool>,
    resume_timeout: Duration,
}

impl StreamClock {
    /// True once the audio callback has run (and no stream error since)
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Clock for StreamClock {
    fn now(&self) -> f64 {
        self.timing.current_seconds()
    }

    /// Wait until the device is pulling audio
    fn resume(&self) -> Result<(), ClockError> {
        let deadline = Instant::now() + self.resume_timeout;
        while !self.is_active() {
            if Instant::now() >= deadline {
                return Err(ClockError::ResumeTimeout(self.resume_timeout));
            }
            thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }
}

/// Sound renderer sending clicks to the audio callback
pub struct StreamRenderer {
    timing: AudioTiming,
    click_tx: HeapProd<ClickEvent>,
    overflowed: bool,
}

impl SoundRenderer for StreamRenderer {
    fn render(&mut self, time: f64, timbre: SoundPreset, is_accent: bool) {
        let event = ClickEvent {
            start_sample: self.timing.seconds_to_samples(time),
            timbre,
            accent: is_accent,
        };
        match self.click_tx.try_push(event) {
            Ok(()) => self.overflowed = false,
            Err(_) => {
                if !self.overflowed {
                    log::warn!("Click queue full, dropping click at {:.3}s", time);
                    self.overflowed = true;
                }
            }
        }
    }
}

impl std::fmt::Debug for StreamRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRenderer")
            .field("sample_rate", &self.timing.sample_rate())
            .finish_non_exhaustive()
    }
}
