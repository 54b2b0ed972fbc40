//! Observed vocal range over a session.

use serde::Serialize;

use crate::pitch::NoteLabel;

/// Lowest and highest pitch heard. Only ever widens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VocalProfile {
    /// +inf until the first observation
    pub min_hz: f64,
    /// 0 until the first observation
    pub max_hz: f64,
    pub min_note: NoteLabel,
    pub max_note: NoteLabel,
}

impl VocalProfile {
    pub fn new() -> Self {
        Self {
            min_hz: f64::INFINITY,
            max_hz: 0.0,
            min_note: NoteLabel::EMPTY,
            max_note: NoteLabel::EMPTY,
        }
    }

    /// Profile spanning `[min_hz, max_hz]`, labelled from the bounds
    pub fn from_range(min_hz: f64, max_hz: f64) -> Self {
        let mut profile = Self::new();
        profile.widen(min_hz);
        profile.widen(max_hz);
        profile
    }

    pub fn is_empty(&self) -> bool {
        !(self.max_hz > 0.0) || !self.min_hz.is_finite()
    }

    pub fn span_hz(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_hz - self.min_hz
        }
    }

    /// Range width in whole semitones
    pub fn span_semitones(&self) -> u32 {
        if self.is_empty() || !(self.min_hz > 0.0) {
            return 0;
        }
        (12.0 * (self.max_hz / self.min_hz).log2()).round().max(0.0) as u32
    }

    fn widen(&mut self, hz: f64) {
        if !(hz > 0.0) || !hz.is_finite() {
            return;
        }
        if hz < self.min_hz {
            self.min_hz = hz;
            self.min_note = NoteLabel::from_frequency(hz);
        }
        if hz > self.max_hz {
            self.max_hz = hz;
            self.max_note = NoteLabel::from_frequency(hz);
        }
    }
}

impl Default for VocalProfile {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates a [`VocalProfile`] from extracted frequencies
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    profile: VocalProfile,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Widen the profile; `None` (no signal) leaves it untouched
    pub fn observe(&mut self, frequency_hz: Option<f64>) {
        if let Some(hz) = frequency_hz {
            self.profile.widen(hz);
        }
    }

    pub fn profile(&self) -> &VocalProfile {
        &self.profile
    }

    /// Snapshot for the session result
    pub fn freeze(&self) -> VocalProfile {
        self.profile.clone()
    }

    pub fn reset(&mut self) {
        self.profile = VocalProfile::new();
    }
}
