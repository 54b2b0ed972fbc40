//! Song catalog entries and JSON loading.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CatalogError;

/// Closed frequency interval in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HzRange {
    pub min: f64,
    pub max: f64,
}

impl HzRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width of the interval; 0 for an inverted or non-finite range
    pub fn span(&self) -> f64 {
        let span = self.max - self.min;
        if span.is_finite() && span > 0.0 {
            span
        } else {
            0.0
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min > 0.0 && self.max >= self.min
    }

    /// Length of the intersection; 0 when disjoint
    pub fn overlap(&self, other: &HzRange) -> f64 {
        let lo = self.min.max(other.min);
        let hi = self.max.min(other.max);
        (hi - lo).max(0.0)
    }

    /// Span of the smallest interval covering both
    pub fn union_span(&self, other: &HzRange) -> f64 {
        let lo = self.min.min(other.min);
        let hi = self.max.max(other.max);
        (hi - lo).max(0.0)
    }

    /// Shrink by `fraction` of the span from each end
    pub fn trimmed(&self, fraction: f64) -> HzRange {
        let inset = self.span() * fraction;
        HzRange::new(self.min + inset, self.max - inset)
    }
}

/// Timbre descriptors, each 0–100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VocalCharacteristics {
    pub pitch_variation: f64,
    pub vibrato: f64,
    pub breathiness: f64,
    pub brightness: f64,
}

impl VocalCharacteristics {
    pub fn new(pitch_variation: f64, vibrato: f64, breathiness: f64, brightness: f64) -> Self {
        Self {
            pitch_variation,
            vibrato,
            breathiness,
            brightness,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Bonus added in the quick recommendation flow
    pub fn quick_bonus(&self) -> f64 {
        match self {
            Difficulty::Easy => 20.0,
            Difficulty::Medium => 10.0,
            Difficulty::Hard => 0.0,
        }
    }

    pub fn reason_tag(&self) -> &'static str {
        match self {
            Difficulty::Easy => "difficulty: comfortable",
            Difficulty::Medium => "difficulty: moderate challenge",
            Difficulty::Hard => "difficulty: challenging",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}' (expected easy, medium or hard)")),
        }
    }
}

/// One song as supplied by the catalog provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongEntry {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub vocal_range_hz: HzRange,

    /// Defaults to `vocal_range_hz` when absent
    #[serde(default)]
    pub comfortable_range_hz: Option<HzRange>,

    #[serde(default)]
    pub characteristics: Option<VocalCharacteristics>,

    pub difficulty: Difficulty,

    #[serde(default)]
    pub genre: String,

    #[serde(default)]
    pub mood: Vec<String>,
}

impl SongEntry {
    pub fn comfortable_range(&self) -> HzRange {
        self.comfortable_range_hz.unwrap_or(self.vocal_range_hz)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::Invalid {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("empty id"));
        }
        if !self.vocal_range_hz.is_valid() {
            return Err(invalid("vocal range must satisfy 0 < min <= max"));
        }
        if let Some(range) = self.comfortable_range_hz {
            if !range.is_valid() {
                return Err(invalid("comfortable range must satisfy 0 < min <= max"));
            }
        }
        if let Some(c) = self.characteristics {
            let values = [c.pitch_variation, c.vibrato, c.breathiness, c.brightness];
            if values.iter().any(|v| !(0.0..=100.0).contains(v)) {
                return Err(invalid("characteristics must be within 0-100"));
            }
        }
        Ok(())
    }
}

/// Read-only list of songs, in provider order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongCatalog {
    songs: Vec<SongEntry>,
}

impl SongCatalog {
    pub fn new(songs: Vec<SongEntry>) -> Result<Self, CatalogError> {
        for song in &songs {
            song.validate()?;
        }
        Ok(Self { songs })
    }

    /// Parse a JSON array of songs
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let songs: Vec<SongEntry> = serde_json::from_str(text)?;
        Self::new(songs)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&text)?;
        debug!(path = %path.display(), songs = catalog.len(), "Loaded song catalog");
        Ok(catalog)
    }

    pub fn songs(&self) -> &[SongEntry] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
