//! Parameter definitions with physical units and documented semantics.
//!
//! Every tuning constant of the game loop and scorer lives here with:
//! - Units in the field name (px, Hz, ms, ticks)
//! - Documented defaults
//! - A `validate()` pass run once at load time

mod audio;
mod playfield;
mod scoring;
mod session;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Re-export all types
pub use audio::{AnalyzerConfig, ExtractorConfig, TimingConfig};
pub use playfield::{ControlConfig, ObstacleConfig, PlayfieldConfig};
pub use scoring::{CharacteristicWeights, ScoringConfig, ScoringWeights};
pub use session::SessionRules;

/// Complete configuration injected into a session controller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub analyzer: AnalyzerConfig,
    pub extractor: ExtractorConfig,
    pub timing: TimingConfig,
    pub playfield: PlayfieldConfig,
    pub obstacles: ObstacleConfig,
    pub control: ControlConfig,
    pub session: SessionRules,
    pub scoring: ScoringConfig,
}

impl GameConfig {
    /// Load a TOML file; missing sections and fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analyzer
            .validate()
            .and_then(|_| self.extractor.validate())
            .and_then(|_| self.timing.validate())
            .and_then(|_| self.playfield.validate())
            .and_then(|_| self.obstacles.validate())
            .and_then(|_| self.control.validate())
            .and_then(|_| self.session.validate())
            .and_then(|_| self.scoring.validate())
            .map_err(ConfigError::Invalid)?;

        let min_gap = self.obstacles.gap_px + 2.0 * self.obstacles.gap_margin_px;
        if min_gap > self.playfield.height_px {
            return Err(ConfigError::Invalid(format!(
                "Obstacle gap plus margins ({min_gap}px) exceeds playfield height ({}px)",
                self.playfield.height_px
            )));
        }
        Ok(())
    }
}
