//! Audio playback for timer completion chimes.

use log::warn;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
}

pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioPlayer {
    /// Creates a new audio player.
    pub fn new() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// Plays the descending chime marking the start of a break.
    pub fn play_break_chime(&self) {
        // C6 down to A5, winding down.
        if let Err(e) = self.play_tone_pair(1046.5, 880.0) {
            warn!("Failed to play chime: {e}");
        }
    }

    /// Plays the ascending chime marking the end of a break.
    pub fn play_work_chime(&self) {
        // A5 up to C6, back to work.
        if let Err(e) = self.play_tone_pair(880.0, 1046.5) {
            warn!("Failed to play chime: {e}");
        }
    }

    /// Plays a short two-tone chime in the background.
    fn play_tone_pair(&self, first_hz: f32, second_hz: f32) -> Result<(), AudioError> {
        use rodio::source::{SineWave, Source};

        let sink = Sink::try_new(&self.handle)?;

        let first = SineWave::new(first_hz)
            .take_duration(Duration::from_millis(150))
            .amplify(0.3);

        let silence =
            rodio::source::Zero::<f32>::new(1, 44100).take_duration(Duration::from_millis(50));

        let second = SineWave::new(second_hz)
            .take_duration(Duration::from_millis(200))
            .amplify(0.3);

        sink.append(first);
        sink.append(silence);
        sink.append(second);
        sink.detach(); // Play in background

        Ok(())
    }
}
