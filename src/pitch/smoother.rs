//! Two-stage smoothing from noisy per-sample pitch to actor position.

use crate::params::{ControlConfig, PlayfieldConfig};

/// Converts extracted frequencies into a damped, rate-capped position.
///
/// Stage 1 (`observe`) runs at sampler cadence. Stage 2 (`advance`) runs every
/// simulation tick, so the position keeps gliding between samples.
#[derive(Debug, Clone)]
pub struct ControlSignalSmoother {
    config: ControlConfig,
    max_position: f64,
    initial_position: f64,
    target_hz: f64,
    position: f64,
}

impl ControlSignalSmoother {
    pub fn new(config: ControlConfig, playfield: &PlayfieldConfig) -> Self {
        let max_position = playfield.max_actor_y();
        let initial_position = (playfield.height_px / 2.0).clamp(0.0, max_position);
        Self {
            config,
            max_position,
            initial_position,
            target_hz: 0.0,
            position: initial_position,
        }
    }

    /// Stage 1: low-pass the target frequency. `None` coasts.
    pub fn observe(&mut self, frequency_hz: Option<f64>) {
        if let Some(hz) = frequency_hz.filter(|hz| *hz > 0.0 && hz.is_finite()) {
            self.target_hz += (hz - self.target_hz) * self.config.frequency_smoothing;
        }
    }

    /// Stage 2: move toward the target position by at most `max_step_px`.
    /// Returns the new position.
    pub fn advance(&mut self) -> f64 {
        if self.target_hz <= 0.0 {
            return self.position;
        }

        let target_y = self.target_position();
        let step = ((target_y - self.position) * self.config.position_smoothing)
            .clamp(-self.config.max_step_px, self.config.max_step_px);
        self.position = (self.position + step).clamp(0.0, self.max_position);
        self.position
    }

    /// Raw target position for the current target frequency.
    /// Higher pitch means smaller y (further up).
    pub fn target_position(&self) -> f64 {
        let (lo, hi) = self.config.reference_band_hz;
        let normalized = ((self.target_hz - lo) / (hi - lo)).clamp(0.0, 1.0);
        (1.0 - normalized) * self.max_position
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn target_hz(&self) -> f64 {
        self.target_hz
    }

    /// Back to mid-field with no target
    pub fn reset(&mut self) {
        self.target_hz = 0.0;
        self.position = self.initial_position;
    }
}
