//! Playfield geometry, obstacle motion and control-signal tuning.

use serde::{Deserialize, Serialize};

/// Playfield dimensions and actor placement (pixels)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldConfig {
    /// Playfield width (px)
    pub width_px: f64,

    /// Playfield height (px)
    pub height_px: f64,

    /// Actor is a square of this side length (px)
    pub actor_size_px: f64,

    /// Fixed horizontal position of the actor's left edge (px)
    pub actor_x_px: f64,
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            width_px: 1280.0,
            height_px: 720.0,
            actor_size_px: 40.0,
            actor_x_px: 100.0,
        }
    }
}

impl PlayfieldConfig {
    /// Highest legal control-signal value (top edge of the actor at the floor)
    pub fn max_actor_y(&self) -> f64 {
        (self.height_px - self.actor_size_px).max(0.0)
    }

    /// Horizontal position of the actor's leading (right) edge
    pub fn actor_leading_edge_x(&self) -> f64 {
        self.actor_x_px + self.actor_size_px
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width_px <= 0.0 || self.height_px <= 0.0 {
            return Err("Playfield dimensions must be > 0".to_string());
        }
        if self.actor_size_px <= 0.0 || self.actor_size_px >= self.height_px {
            return Err(format!(
                "Actor size must be in (0, height), got {}",
                self.actor_size_px
            ));
        }
        Ok(())
    }
}

/// Obstacle geometry and scroll behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Obstacle width (px)
    pub width_px: f64,

    /// Vertical opening the actor must pass through (px)
    pub gap_px: f64,

    /// Leftward scroll per simulation tick (px)
    pub speed_px_per_tick: f64,

    /// Distance the newest obstacle must travel before the next spawns (px)
    pub spawn_spacing_px: f64,

    /// Minimum distance between the gap and the top/bottom edges (px)
    pub gap_margin_px: f64,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            width_px: 80.0,
            gap_px: 200.0,
            speed_px_per_tick: 1.5,
            spawn_spacing_px: 500.0,
            gap_margin_px: 50.0,
        }
    }
}

impl ObstacleConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.width_px <= 0.0 || self.gap_px <= 0.0 {
            return Err("Obstacle width and gap must be > 0".to_string());
        }
        if self.speed_px_per_tick <= 0.0 {
            return Err("Obstacle speed must be > 0".to_string());
        }
        if self.gap_margin_px < 0.0 || self.spawn_spacing_px < 0.0 {
            return Err("Obstacle margin and spacing must be >= 0".to_string());
        }
        Ok(())
    }
}

/// Two-stage control smoothing.
///
/// Stage 1 low-passes the raw frequency into a target frequency.
/// Stage 2 low-passes the actor position toward the target, rate-capped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Frequency band mapped onto the full playfield height (Hz)
    pub reference_band_hz: (f64, f64),

    /// Stage 1 factor per observed sample
    pub frequency_smoothing: f64,

    /// Stage 2 factor per simulation tick
    pub position_smoothing: f64,

    /// Stage 2 displacement cap per simulation tick (px)
    pub max_step_px: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            reference_band_hz: (150.0, 400.0),
            frequency_smoothing: 0.1,
            position_smoothing: 0.02,
            max_step_px: 2.0,
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), String> {
        let (lo, hi) = self.reference_band_hz;
        if hi <= lo {
            return Err(format!("Reference band must satisfy min < max, got ({lo}, {hi})"));
        }
        for (name, factor) in [
            ("frequency_smoothing", self.frequency_smoothing),
            ("position_smoothing", self.position_smoothing),
        ] {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(format!("{name} must be in (0, 1], got {factor}"));
            }
        }
        if self.max_step_px <= 0.0 {
            return Err("max_step_px must be > 0".to_string());
        }
        Ok(())
    }
}
