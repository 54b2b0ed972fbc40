//! Recommendation scoring weights and result shaping.

use serde::{Deserialize, Serialize};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Factor weights for the analysis-driven flow (sum to 1.0)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub range: f64,
    pub characteristics: f64,
    pub preference: f64,
    pub confidence: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            range: 0.4,
            characteristics: 0.3,
            preference: 0.2,
            confidence: 0.1,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.range + self.characteristics + self.preference + self.confidence
    }
}

/// Per-characteristic weights within the characteristics factor (sum to 1.0).
/// Brightness dominates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacteristicWeights {
    pub pitch_variation: f64,
    pub vibrato: f64,
    pub breathiness: f64,
    pub brightness: f64,
}

impl Default for CharacteristicWeights {
    fn default() -> Self {
        Self {
            pitch_variation: 0.2,
            vibrato: 0.2,
            breathiness: 0.2,
            brightness: 0.4,
        }
    }
}

impl CharacteristicWeights {
    pub fn sum(&self) -> f64 {
        self.pitch_variation + self.vibrato + self.breathiness + self.brightness
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub characteristic_weights: CharacteristicWeights,

    /// Results scoring below this are dropped (full flow)
    pub min_match_score: f64,

    /// Maximum results returned by the full flow
    pub result_count: usize,

    /// Maximum results returned by the post-game quick flow
    pub quick_result_count: usize,

    /// Upper bound (exclusive) of the quick flow's random jitter
    pub jitter_max: f64,

    /// Fraction of the observed span trimmed from each end to form the
    /// comfortable range of a min/max-only profile
    pub comfortable_trim: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            characteristic_weights: CharacteristicWeights::default(),
            min_match_score: 30.0,
            result_count: 10,
            quick_result_count: 5,
            jitter_max: 10.0,
            comfortable_trim: 0.2,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), String> {
        if (self.weights.sum() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(format!(
                "Scoring weights must sum to 1.0, got {}",
                self.weights.sum()
            ));
        }
        if (self.characteristic_weights.sum() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(format!(
                "Characteristic weights must sum to 1.0, got {}",
                self.characteristic_weights.sum()
            ));
        }
        if self.jitter_max < 0.0 {
            return Err("jitter_max must be >= 0".to_string());
        }
        if !(0.0..0.5).contains(&self.comfortable_trim) {
            return Err("comfortable_trim must be in [0, 0.5)".to_string());
        }
        Ok(())
    }
}
