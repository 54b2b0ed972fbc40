//! Live microphone capture via cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::{AudioSource, SpectrumAnalyzer, SpectrumFrame};
use crate::error::CaptureError;
use crate::params::AnalyzerConfig;

type SharedWavWriter = Arc<Mutex<hound::WavWriter<BufWriter<File>>>>;

/// Number of FFT windows of history kept in the capture buffer
const HISTORY_WINDOWS: usize = 4;

/// Microphone input feeding a spectrum analyzer.
///
/// The stream is not `Send`; build this on the thread that will poll it.
/// Dropping the source stops the stream and finalizes any recording.
pub struct MicrophoneSource {
    /// Mono samples accumulated by the input callback
    samples: Arc<Mutex<Vec<f32>>>,
    analyzer: SpectrumAnalyzer,
    fft_size: usize,
    sample_rate: f64,

    /// Input stream (kept alive)
    _stream: cpal::Stream,
}

impl MicrophoneSource {
    /// Open the default input device, optionally recording the capture to WAV
    pub fn open(config: &AnalyzerConfig, record_to: Option<&Path>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::Device(e.to_string()))?;

        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(CaptureError::UnsupportedFormat(format!(
                "{:?}",
                supported.sample_format()
            )));
        }

        let channels = supported.channels().max(1) as usize;
        let sample_rate = supported.sample_rate().0;

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels,
            "Microphone opened"
        );

        // Create WAV writer if recording
        let wav_writer: Option<SharedWavWriter> = match record_to {
            Some(path) => {
                let spec = hound::WavSpec {
                    channels: 1,
                    sample_rate,
                    bits_per_sample: 32,
                    sample_format: hound::SampleFormat::Float,
                };
                let writer = hound::WavWriter::create(path, spec)?;
                Some(Arc::new(Mutex::new(writer)))
            }
            None => None,
        };

        let samples = Arc::new(Mutex::new(Vec::<f32>::new()));
        let samples_cb = Arc::clone(&samples);
        let capacity = config.fft_size * HISTORY_WINDOWS;

        let stream = device
            .build_input_stream(
                &supported.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let Ok(mut buf) = samples_cb.lock() else {
                        return;
                    };

                    // Keep the first channel only
                    buf.extend(data.chunks(channels).filter_map(|frame| frame.first().copied()));
                    if buf.len() > capacity {
                        let excess = buf.len() - capacity;
                        buf.drain(0..excess);
                    }

                    if let Some(ref writer) = wav_writer {
                        if let Ok(mut w) = writer.lock() {
                            for frame in data.chunks(channels) {
                                if let Some(&sample) = frame.first() {
                                    let _ = w.write_sample(sample);
                                }
                            }
                        }
                    }
                },
                |err| warn!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        Ok(Self {
            samples,
            analyzer: SpectrumAnalyzer::new(config),
            fft_size: config.fft_size,
            sample_rate: sample_rate as f64,
            _stream: stream,
        })
    }
}

impl AudioSource for MicrophoneSource {
    fn latest_frequency_buffer(&mut self) -> Option<SpectrumFrame> {
        let recent: Vec<f32> = {
            let buf = match self.samples.lock() {
                Ok(buf) => buf,
                Err(poisoned) => poisoned.into_inner(),
            };
            if buf.len() < self.fft_size {
                return None;
            }
            buf[buf.len() - self.fft_size..].to_vec()
        };

        Some(self.analyzer.frame(&recent, self.sample_rate))
    }
}
