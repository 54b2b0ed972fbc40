//! Scoring inputs: the user's voice and their stated preferences.

use serde::{Deserialize, Serialize};

use super::catalog::{Difficulty, HzRange, VocalCharacteristics};
use crate::game::VocalProfile;

/// One take from a voice test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceTestResult {
    /// Test score, 0–100
    pub score: f64,
    #[serde(default)]
    pub frequency: Option<f64>,
    #[serde(default)]
    pub characteristics: Option<VocalCharacteristics>,
}

/// Rich profile produced by the analysis flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocalAnalysisProfile {
    /// `None` when no pitch was ever observed
    pub vocal_range: Option<HzRange>,
    pub comfortable_range: Option<HzRange>,
    pub characteristics: Option<VocalCharacteristics>,
    /// 0–100; `None` is maximally uncertain
    pub confidence: Option<f64>,
}

impl VocalAnalysisProfile {
    /// Aggregate voice-test takes into one profile. `trim` is the fraction
    /// of the span cut from each end for the comfortable range.
    pub fn from_test_results(results: &[VoiceTestResult], trim: f64) -> Self {
        let frequencies: Vec<f64> = results
            .iter()
            .filter_map(|r| r.frequency)
            .filter(|f| *f > 0.0 && f.is_finite())
            .collect();

        let vocal_range = (!frequencies.is_empty()).then(|| {
            let min = frequencies.iter().copied().fold(f64::INFINITY, f64::min);
            let max = frequencies.iter().copied().fold(0.0, f64::max);
            HzRange::new(min, max)
        });

        let with_characteristics: Vec<&VocalCharacteristics> =
            results.iter().filter_map(|r| r.characteristics.as_ref()).collect();
        let characteristics = (!with_characteristics.is_empty()).then(|| {
            let n = with_characteristics.len() as f64;
            let mean = |f: fn(&VocalCharacteristics) -> f64| {
                with_characteristics.iter().map(|c| f(c)).sum::<f64>() / n
            };
            VocalCharacteristics::new(
                mean(|c| c.pitch_variation),
                mean(|c| c.vibrato),
                mean(|c| c.breathiness),
                mean(|c| c.brightness),
            )
        });

        // Without any pitch the takes say nothing about the voice
        let confidence = match vocal_range {
            Some(_) => {
                let mean = results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64;
                Some(mean.clamp(0.0, 100.0))
            }
            None => None,
        };

        Self {
            vocal_range,
            comfortable_range: vocal_range.map(|r| r.trimmed(trim)),
            characteristics,
            confidence,
        }
    }

    /// Analysis-shaped profile from a game session's recorded range
    pub fn from_session(profile: &VocalProfile, confidence: Option<f64>, trim: f64) -> Self {
        let vocal_range = session_range(profile);
        Self {
            vocal_range,
            comfortable_range: vocal_range.map(|r| r.trimmed(trim)),
            characteristics: None,
            confidence: vocal_range.and(confidence.map(|c| c.clamp(0.0, 100.0))),
        }
    }

    /// Takes that carried no pitch borrow the range sung during the session.
    /// Characteristics are kept; confidence stays unknown.
    pub fn or_session_range(self, session: &VocalProfile, trim: f64) -> Self {
        if self.vocal_range.is_some() {
            return self;
        }
        Self {
            characteristics: self.characteristics,
            ..Self::from_session(session, None, trim)
        }
    }
}

/// Either profile shape accepted by the scorer
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringProfile {
    /// Min/max only, from a game session
    Minimal(VocalProfile),
    Analysis(VocalAnalysisProfile),
}

impl ScoringProfile {
    /// Full observed range
    pub fn vocal_range(&self) -> Option<HzRange> {
        match self {
            ScoringProfile::Minimal(profile) => session_range(profile),
            ScoringProfile::Analysis(profile) => profile.vocal_range,
        }
    }

    /// Comfortable range; derived by trimming for the minimal shape
    pub fn comfortable_range(&self, trim: f64) -> Option<HzRange> {
        match self {
            ScoringProfile::Minimal(profile) => session_range(profile).map(|r| r.trimmed(trim)),
            ScoringProfile::Analysis(profile) => profile.comfortable_range,
        }
    }

    pub fn characteristics(&self) -> Option<&VocalCharacteristics> {
        match self {
            ScoringProfile::Minimal(_) => None,
            ScoringProfile::Analysis(profile) => profile.characteristics.as_ref(),
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            ScoringProfile::Minimal(_) => None,
            ScoringProfile::Analysis(profile) => profile.confidence,
        }
    }
}

impl From<VocalProfile> for ScoringProfile {
    fn from(profile: VocalProfile) -> Self {
        ScoringProfile::Minimal(profile)
    }
}

impl From<VocalAnalysisProfile> for ScoringProfile {
    fn from(profile: VocalAnalysisProfile) -> Self {
        ScoringProfile::Analysis(profile)
    }
}

fn session_range(profile: &VocalProfile) -> Option<HzRange> {
    (!profile.is_empty()).then(|| HzRange::new(profile.min_hz, profile.max_hz))
}

/// Explicit user preferences for the full flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub moods: Vec<String>,
}

impl UserPreferences {
    /// True when nothing was stated
    pub fn is_empty(&self) -> bool {
        self.genre.as_deref().map_or(true, |g| g.trim().is_empty())
            && self.difficulty.is_none()
            && self.moods.is_empty()
    }
}
