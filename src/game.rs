//! Pitch-driven obstacle game: state machine, simulation and scheduling.

mod collision;
mod obstacle;
mod recorder;
pub mod runner;
mod session;

use std::fmt;

use serde::Serialize;

// Re-export public types
pub use collision::{CollisionSystem, DamageOutcome, DamageState};
pub use obstacle::{Obstacle, ObstacleField};
pub use recorder::{SessionRecorder, VocalProfile};
pub use runner::{drive_offline, SessionRunner};
pub use session::{EndReason, GameSessionController, SessionEvent, SessionResult, TickReport};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Ended,
}

impl SessionState {
    /// Running or paused
    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Ended => "ended",
        };
        write!(f, "{}", name)
    }
}
