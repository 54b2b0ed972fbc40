//! WAV file playback as an offline audio source.

use std::path::Path;
use tracing::debug;

use super::{AudioSource, SpectrumAnalyzer, SpectrumFrame};
use crate::error::CaptureError;
use crate::params::AnalyzerConfig;

/// Steps through a decoded WAV file one sampler period per pull
pub struct WavFileSource {
    samples: Vec<f32>,
    sample_rate: u32,
    cursor: usize,
    hop: usize,
    analyzer: SpectrumAnalyzer,
}

impl WavFileSource {
    /// Decode `path` (first channel only) and advance `hop_ms` per pull
    pub fn open(
        path: impl AsRef<Path>,
        config: &AnalyzerConfig,
        hop_ms: u64,
    ) -> Result<Self, CaptureError> {
        let mut reader = hound::WavReader::open(path.as_ref())?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let full_scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / full_scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let samples: Vec<f32> = interleaved.into_iter().step_by(channels).collect();
        debug!(
            path = %path.as_ref().display(),
            frames = samples.len(),
            sample_rate = spec.sample_rate,
            "WAV source loaded"
        );

        Ok(Self::from_samples(samples, spec.sample_rate, config, hop_ms))
    }

    /// Wrap already-decoded mono samples
    pub fn from_samples(
        samples: Vec<f32>,
        sample_rate: u32,
        config: &AnalyzerConfig,
        hop_ms: u64,
    ) -> Self {
        let hop = ((sample_rate as u64 * hop_ms) / 1000).max(1) as usize;
        Self {
            samples,
            sample_rate,
            cursor: 0,
            hop,
            analyzer: SpectrumAnalyzer::new(config),
        }
    }

    /// Duration of the decoded audio (seconds)
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate.max(1) as f64
    }
}

impl AudioSource for WavFileSource {
    fn latest_frequency_buffer(&mut self) -> Option<SpectrumFrame> {
        if self.cursor >= self.samples.len() {
            return None;
        }
        self.cursor = (self.cursor + self.hop).min(self.samples.len());
        let played = &self.samples[..self.cursor];
        Some(self.analyzer.frame(played, self.sample_rate as f64))
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ExtractorConfig;
    use crate::pitch::FrequencyExtractor;
    use std::f32::consts::PI;

    fn write_tone(path: &Path, freq_hz: f32, seconds: f32) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let frames = (44100.0 * seconds) as usize;
        for i in 0..frames {
            let s = (0.5 * (2.0 * PI * freq_hz * i as f32 / 44100.0).sin() * i16::MAX as f32) as i16;
            writer.write_sample(s).unwrap();
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_wav_source_steps_and_exhausts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_tone(&path, 300.0, 0.5);

        let config = AnalyzerConfig {
            smoothing_time_constant: 0.0,
            ..AnalyzerConfig::default()
        };
        let mut source = WavFileSource::open(&path, &config, 200).unwrap();
        assert!((source.duration_secs() - 0.5).abs() < 0.01);

        // 0.5 s in 200 ms hops: 3 pulls
        let extractor = FrequencyExtractor::new(ExtractorConfig::default());
        let mut pulls = 0;
        while let Some(frame) = source.latest_frequency_buffer() {
            let hz = extractor.extract_frame(&frame).expect("tone should be detected");
            assert!((hz - 300.0).abs() < 25.0, "detected {}", hz);
            pulls += 1;
        }
        assert_eq!(pulls, 3);
        assert!(source.is_exhausted());
    }

    #[test]
    fn test_missing_file_is_capture_error() {
        let result = WavFileSource::open("/nonexistent/voice.wav", &AnalyzerConfig::default(), 200);
        assert!(matches!(result, Err(CaptureError::File(_))));
    }
}
