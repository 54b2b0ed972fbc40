//! Error types shared across the crate.

use thiserror::Error;

use crate::game::SessionState;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error, wrapping each subsystem's failure type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Audio capture unavailable: {0}")]
    Capture(#[from] CaptureError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration loading or validation failure
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Song catalog loading failure
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid catalog entry '{id}': {reason}")]
    Invalid { id: String, reason: String },
}

/// Audio acquisition failure.
///
/// Distinct from "no pitch on this tick": a session with no capture keeps
/// running as if permanently silent.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no audio input device found")]
    NoInputDevice,

    #[error("input device error: {0}")]
    Device(String),

    #[error("input stream error: {0}")]
    Stream(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("audio file error: {0}")]
    File(#[from] hound::Error),

    #[error("synthesis engine error: {0}")]
    Synth(String),
}

/// Session lifecycle and gating failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while session is {from:?}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },

    #[error("insufficient score for recommendations: {score} < {required}")]
    InsufficientScore { score: u32, required: u32 },

    #[error("session has not ended")]
    NotEnded,
}
