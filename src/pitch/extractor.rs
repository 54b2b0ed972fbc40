//! Dominant-bin frequency estimate from a magnitude spectrum.
//!
//! This is deliberately naive: it reports the loudest bin, not the
//! fundamental. The decision policy (noise floor, peak floor, band) is the
//! observable contract.

use crate::audio::SpectrumFrame;
use crate::params::ExtractorConfig;

#[derive(Debug, Clone)]
pub struct FrequencyExtractor {
    config: ExtractorConfig,
}

impl FrequencyExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Frequency (Hz) of the dominant bin, or `None` for "no signal"
    pub fn extract(&self, magnitudes_db: &[f64], sample_rate: f64) -> Option<f64> {
        if magnitudes_db.is_empty() || !(sample_rate > 0.0) {
            return None;
        }

        let len = magnitudes_db.len() as f64;
        let mean_abs = magnitudes_db.iter().map(|m| m.abs()).sum::<f64>() / len;
        if !(mean_abs >= self.config.noise_floor) {
            return None;
        }

        // First maximum wins on ties
        let (peak_index, peak_db) = magnitudes_db.iter().enumerate().fold(
            (0usize, f64::NEG_INFINITY),
            |(best_i, best_db), (i, &db)| {
                if db > best_db {
                    (i, db)
                } else {
                    (best_i, best_db)
                }
            },
        );

        if peak_db < self.config.peak_floor_db {
            return None;
        }

        let frequency = peak_index as f64 / len * (sample_rate / 2.0);
        let (band_min, band_max) = self.config.vocal_band_hz;
        if frequency > band_min && frequency < band_max {
            Some(frequency)
        } else {
            None
        }
    }

    pub fn extract_frame(&self, frame: &SpectrumFrame) -> Option<f64> {
        self.extract(&frame.magnitudes_db, frame.sample_rate)
    }
}

impl Default for FrequencyExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}
