//! Song recommendation from a recorded or analysed vocal profile.
//!
//! Scoring is pure: the catalog is borrowed read-only and the only source of
//! nondeterminism (quick-flow jitter) is an injected RNG.

mod catalog;
mod profile;
mod scorer;

// Re-export public types
pub use catalog::{Difficulty, HzRange, SongCatalog, SongEntry, VocalCharacteristics};
pub use profile::{ScoringProfile, UserPreferences, VocalAnalysisProfile, VoiceTestResult};
pub use scorer::{
    characteristics_match, preference_boost, range_match, FactorScores, RecommendationResult,
    RecommendationScorer,
};
