//! Audio acquisition boundary and spectrum analysis.
//!
//! The game core only ever sees [`SpectrumFrame`]s pulled through the
//! [`AudioSource`] trait. Concrete sources wrap a microphone (cpal), a WAV
//! file (hound) or a synthesized guide tone (glicol).

mod capture;
mod fft;
mod file;
mod synthesis;

use std::collections::VecDeque;

// Re-export public types
pub use capture::MicrophoneSource;
pub use fft::{hann_window, SpectrumAnalyzer, MIN_DECIBELS};
pub use file::WavFileSource;
pub use synthesis::{SynthSource, GUIDE_TONE};

/// One frequency-domain snapshot of the input
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    /// Half-spectrum magnitudes in dB, lowest bin first
    pub magnitudes_db: Vec<f64>,

    /// Sample rate of the audio the spectrum was computed from (Hz)
    pub sample_rate: f64,
}

impl SpectrumFrame {
    pub fn new(magnitudes_db: Vec<f64>, sample_rate: f64) -> Self {
        Self {
            magnitudes_db,
            sample_rate,
        }
    }

    /// Frame whose only prominent bin sits nearest `frequency_hz`.
    ///
    /// Useful for hosts and tests that want to drive a session without audio.
    pub fn with_peak(frequency_hz: f64, bins: usize, sample_rate: f64, peak_db: f64) -> Self {
        let mut magnitudes_db = vec![MIN_DECIBELS; bins];
        if bins > 0 && sample_rate > 0.0 {
            let index = (frequency_hz / (sample_rate / 2.0) * bins as f64).round() as usize;
            if let Some(bin) = magnitudes_db.get_mut(index) {
                *bin = peak_db;
            }
        }
        Self::new(magnitudes_db, sample_rate)
    }

    /// Frame with every bin at the analyser floor
    pub fn silent(bins: usize, sample_rate: f64) -> Self {
        Self::new(vec![MIN_DECIBELS; bins], sample_rate)
    }
}

/// Non-blocking "latest buffer" pull from an audio collaborator
pub trait AudioSource {
    /// Newest spectrum, or `None` if no data is ready yet
    fn latest_frequency_buffer(&mut self) -> Option<SpectrumFrame>;

    /// True once a finite source has nothing left to deliver
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<S: AudioSource + ?Sized> AudioSource for Box<S> {
    fn latest_frequency_buffer(&mut self) -> Option<SpectrumFrame> {
        (**self).latest_frequency_buffer()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// Source that never produces data; stands in when capture is unavailable
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSource;

impl AudioSource for SilentSource {
    fn latest_frequency_buffer(&mut self) -> Option<SpectrumFrame> {
        None
    }
}

/// Source replaying a prepared sequence of frames, then exhausting
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    frames: VecDeque<Option<SpectrumFrame>>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Option<SpectrumFrame>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl AudioSource for ScriptedSource {
    fn latest_frequency_buffer(&mut self) -> Option<SpectrumFrame> {
        self.frames.pop_front().flatten()
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }
}
