//! FFT spectrum analysis and utilities.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::SpectrumFrame;
use crate::params::AnalyzerConfig;

/// Floor reported for silent bins (dB)
pub const MIN_DECIBELS: f64 = -160.0;

/// Windowed FFT producing smoothed half-spectrum magnitudes in dB
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    size: usize,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    /// Linear magnitudes carried between frames
    smoothed: Vec<f64>,
    smoothing: f64,
}

impl SpectrumAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        let size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let window = (0..size).map(|i| hann_window(i, size)).collect();

        Self {
            fft,
            size,
            window,
            buffer: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; size / 2],
            smoothing: config.smoothing_time_constant,
        }
    }

    /// Number of bins per output frame
    pub fn bin_count(&self) -> usize {
        self.size / 2
    }

    /// Analyze the newest `fft_size` samples (zero-padded at the front if short)
    pub fn analyze(&mut self, samples: &[f32]) -> Vec<f64> {
        let start = samples.len().saturating_sub(self.size);
        let recent = &samples[start..];
        let pad = self.size - recent.len();

        // Apply Hann window
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        // Perform FFT
        self.fft.process(&mut self.buffer);

        let scale = self.size as f64;
        self.smoothed
            .iter_mut()
            .zip(self.buffer.iter())
            .map(|(avg, bin)| {
                let magnitude = bin.norm() as f64 / scale;
                *avg = self.smoothing * *avg + (1.0 - self.smoothing) * magnitude;
                to_decibels(*avg)
            })
            .collect()
    }

    /// Analyze and wrap as a frame for the extractor
    pub fn frame(&mut self, samples: &[f32], sample_rate: f64) -> SpectrumFrame {
        SpectrumFrame::new(self.analyze(samples), sample_rate)
    }

    /// Forget inter-frame smoothing state
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|m| *m = 0.0);
    }
}

fn to_decibels(magnitude: f64) -> f64 {
    if magnitude > 0.0 {
        (20.0 * magnitude.log10()).max(MIN_DECIBELS)
    } else {
        MIN_DECIBELS
    }
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}
