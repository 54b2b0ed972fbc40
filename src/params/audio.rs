//! Audio analysis and pitch extraction configuration.

use serde::{Deserialize, Serialize};

/// Spectrum analysis configuration (FFT front end feeding the extractor)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Expected capture sample rate (Hz)
    pub sample_rate_hz: u32,

    /// FFT window size (must be power of 2); the magnitude buffer is half this
    pub fft_size: usize,

    /// Exponential averaging between successive frames, in [0, 1).
    /// 0.8 matches a browser analyser node's default.
    pub smoothing_time_constant: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 2048,
            smoothing_time_constant: 0.8,
        }
    }
}

impl AnalyzerConfig {
    /// Number of magnitude bins produced per frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 2 {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(format!(
                "Smoothing time constant must be in [0, 1), got {}",
                self.smoothing_time_constant
            ));
        }
        Ok(())
    }
}

/// Dominant-bin frequency extractor thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Accepted vocal band (Hz, exclusive on both ends)
    pub vocal_band_hz: (f64, f64),

    /// Minimum mean absolute magnitude across the buffer.
    /// An all-zero (unfilled) buffer falls below this.
    pub noise_floor: f64,

    /// Minimum peak magnitude (dB)
    pub peak_floor_db: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            vocal_band_hz: (80.0, 800.0),
            noise_floor: 1e-6,
            peak_floor_db: -50.0,
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<(), String> {
        let (lo, hi) = self.vocal_band_hz;
        if !(lo >= 0.0 && hi > lo) {
            return Err(format!("Vocal band must satisfy 0 <= min < max, got ({lo}, {hi})"));
        }
        if self.noise_floor < 0.0 {
            return Err("Noise floor must be >= 0".to_string());
        }
        Ok(())
    }
}

/// The two decoupled cadences driving a live session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Simulation tick rate (Hz)
    pub tick_rate_hz: u32,

    /// Sampler period (milliseconds); 200 ms = 5 Hz
    pub sampler_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            sampler_interval_ms: 200,
        }
    }
}

impl TimingConfig {
    /// Convert a duration in seconds to whole simulation ticks
    pub fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        (seconds * self.tick_rate_hz as f64).round().max(0.0) as u64
    }

    /// Simulation ticks elapsed per sampler period (at least 1)
    pub fn ticks_per_sample(&self) -> u64 {
        let ticks = (self.sampler_interval_ms as f64 * self.tick_rate_hz as f64 / 1000.0).round();
        (ticks as u64).max(1)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz == 0 {
            return Err("Tick rate must be > 0".to_string());
        }
        if self.sampler_interval_ms == 0 {
            return Err("Sampler interval must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_analyzer_is_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 1024);
    }

    #[test]
    fn test_non_power_of_two_rejected() {
        let config = AnalyzerConfig {
            fft_size: 1000,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ticks_per_sample() {
        let timing = TimingConfig::default();
        // 200 ms at 60 Hz = 12 ticks
        assert_eq!(timing.ticks_per_sample(), 12);
        assert_eq!(timing.seconds_to_ticks(2.0), 120);
    }
}
