//! Frequency to note-name mapping (A4 = 440 Hz).

use serde::Serialize;
use std::fmt;

pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const A4_HZ: f64 = 440.0;
const A4_NOTE_NUMBER: i64 = 69;

/// Pitch class plus octave, e.g. `A4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteLabel {
    pub name: &'static str,
    pub octave: i32,
}

impl NoteLabel {
    /// Label for "no pitch"
    pub const EMPTY: NoteLabel = NoteLabel {
        name: "",
        octave: 0,
    };

    /// Nearest equal-tempered note; `EMPTY` for non-positive or non-finite input
    pub fn from_frequency(frequency_hz: f64) -> Self {
        if !(frequency_hz > 0.0) || !frequency_hz.is_finite() {
            return Self::EMPTY;
        }

        let semitone_offset = (12.0 * (frequency_hz / A4_HZ).log2()).round() as i64;
        let note_number = semitone_offset + A4_NOTE_NUMBER;
        let octave = note_number.div_euclid(12) - 1;
        let pitch_class = note_number.rem_euclid(12) as usize;

        Self {
            name: PITCH_CLASSES[pitch_class],
            octave: octave as i32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl Default for NoteLabel {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for NoteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "--")
        } else {
            write!(f, "{}{}", self.name, self.octave)
        }
    }
}

/// Shorthand for [`NoteLabel::from_frequency`]
pub fn note_for(frequency_hz: f64) -> NoteLabel {
    NoteLabel::from_frequency(frequency_hz)
}
