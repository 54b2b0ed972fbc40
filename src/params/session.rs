//! Session rules: lives, invulnerability and recommendation gating.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRules {
    /// Lives at session start
    pub max_lives: u32,

    /// Post-hit grace window (simulation ticks); 120 = 2 s at 60 Hz
    pub invulnerability_grace_ticks: u64,

    /// Score required before recommendations may be requested
    pub min_score_for_recommendations: u32,

    /// When false, recommendations are available regardless of score
    pub gate_recommendations: bool,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            max_lives: 3,
            invulnerability_grace_ticks: 120,
            min_score_for_recommendations: 15,
            gate_recommendations: true,
        }
    }
}

impl SessionRules {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_lives == 0 {
            return Err("max_lives must be >= 1".to_string());
        }
        Ok(())
    }
}
