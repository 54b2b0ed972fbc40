//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::recommend::{Difficulty, UserPreferences};

/// Where session audio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Default input device, in real time
    Mic,
    /// WAV file, as fast as possible
    Wav,
    /// Synthesized guide tone, as fast as possible
    Synth,
    /// No input at all
    Silent,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "pitchpilot")]
#[command(about = "Steer with your voice, then get songs that fit your range", long_about = None)]
pub struct Args {
    /// TOML configuration overriding the defaults
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// JSON song catalog
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Audio source
    #[arg(long, value_enum, default_value = "mic")]
    pub source: SourceKind,

    /// Input file for `--source wav`
    #[arg(long, value_name = "PATH")]
    pub wav: Option<PathBuf>,

    /// Seed for obstacle gaps and recommendation jitter
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop the session after this long (seconds)
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub max_seconds: Option<f64>,

    /// Record microphone input to a WAV file
    #[arg(long, value_name = "PATH")]
    pub record: Option<PathBuf>,

    /// Preferred genre (full flow)
    #[arg(long)]
    pub genre: Option<String>,

    /// Preferred difficulty: easy, medium, hard (full flow)
    #[arg(long)]
    pub difficulty: Option<Difficulty>,

    /// Preferred mood; repeat for several (full flow)
    #[arg(long = "mood", value_name = "MOOD")]
    pub moods: Vec<String>,

    /// Use the full analysis-driven scorer instead of quick picks
    #[arg(long)]
    pub full: bool,

    /// JSON voice-test results to score against (implies --full)
    #[arg(long, value_name = "PATH")]
    pub voice_tests: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Stated preferences, or `None` if none were given
    pub fn preferences(&self) -> Option<UserPreferences> {
        let preferences = UserPreferences {
            genre: self.genre.clone(),
            difficulty: self.difficulty,
            moods: self.moods.clone(),
        };
        (!preferences.is_empty()).then_some(preferences)
    }

    pub fn full_flow(&self) -> bool {
        self.full || self.voice_tests.is_some()
    }

    /// Synthesized sessions need a finite length
    pub fn synth_duration_secs(&self) -> f64 {
        self.max_seconds.unwrap_or(60.0)
    }
}

/// A finite, non-negative number of seconds
fn parse_seconds(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("{s} is not a finite, non-negative duration"));
    }
    Ok(secs)
}
