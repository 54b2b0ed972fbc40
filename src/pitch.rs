//! Pitch pipeline: spectrum → frequency → note label → control signal.

mod extractor;
mod note;
mod smoother;

// Re-export public types
pub use extractor::FrequencyExtractor;
pub use note::{note_for, NoteLabel, PITCH_CLASSES};
pub use smoother::ControlSignalSmoother;

/// One extracted frequency, stamped with the simulation tick it arrived on.
/// `frequency_hz == 0.0` means no detected pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencySample {
    pub frequency_hz: f64,
    pub sampled_at_tick: u64,
}

impl FrequencySample {
    pub fn new(frequency: Option<f64>, sampled_at_tick: u64) -> Self {
        Self {
            frequency_hz: frequency.unwrap_or(0.0),
            sampled_at_tick,
        }
    }

    /// The frequency, or `None` for a no-signal sample
    pub fn frequency(&self) -> Option<f64> {
        (self.frequency_hz > 0.0).then_some(self.frequency_hz)
    }

    pub fn note(&self) -> NoteLabel {
        note_for(self.frequency_hz)
    }
}
