//! pitchpilot library - voice-steered obstacle game and vocal-range song
//! recommendation

pub mod audio;
pub mod cli;
pub mod error;
pub mod game;
pub mod params;
pub mod pitch;
pub mod recommend;

pub use error::{Error, Result};
