//! Synthesized guide voice for playing without a microphone.

use glicol::Engine;
use tracing::debug;

use super::{AudioSource, SpectrumAnalyzer, SpectrumFrame};
use crate::error::CaptureError;
use crate::params::AnalyzerConfig;

/// Audio block size (samples per engine block)
const BLOCK_SIZE: usize = 128;

/// Glicol guide tone: a sine slowly sweeping ~130-370 Hz (20 s period)
pub const GUIDE_TONE: &str = r#"
~pit: sin 0.05 >> mul 120 >> add 250
o: sin ~pit >> mul 0.4
"#;

/// Offline glicol renderer stepping one sampler period per pull
pub struct SynthSource {
    engine: Engine<BLOCK_SIZE>,
    history: Vec<f32>,
    fft_size: usize,
    sample_rate: usize,
    hop: usize,
    rendered: usize,
    total: usize,
    analyzer: SpectrumAnalyzer,
}

impl SynthSource {
    /// Render `code` for `duration_secs`, advancing `hop_ms` per pull
    pub fn new(
        code: &str,
        config: &AnalyzerConfig,
        hop_ms: u64,
        duration_secs: f64,
    ) -> Result<Self, CaptureError> {
        let sample_rate = config.sample_rate_hz as usize;

        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(sample_rate);
        engine.update_with_code(code);
        engine
            .update()
            .map_err(|e| CaptureError::Synth(format!("{:?}", e)))?;

        let total = (duration_secs.max(0.0) * sample_rate as f64) as usize;
        debug!(duration_secs, sample_rate, "Guide tone synthesizer ready");

        Ok(Self {
            engine,
            history: Vec::with_capacity(config.fft_size * 2),
            fft_size: config.fft_size,
            sample_rate,
            hop: ((sample_rate as u64 * hop_ms) / 1000).max(1) as usize,
            rendered: 0,
            total,
            analyzer: SpectrumAnalyzer::new(config),
        })
    }

    /// Render the next `count` samples into the history window
    fn render(&mut self, count: usize) {
        let mut remaining = count;
        while remaining > 0 {
            let (buffers, _) = self.engine.next_block(vec![]);
            let take = remaining.min(BLOCK_SIZE);
            for i in 0..take {
                self.history.push(buffers[0][i]);
            }
            remaining -= take;
        }

        if self.history.len() > self.fft_size {
            let excess = self.history.len() - self.fft_size;
            self.history.drain(0..excess);
        }
    }
}

impl AudioSource for SynthSource {
    fn latest_frequency_buffer(&mut self) -> Option<SpectrumFrame> {
        if self.is_exhausted() {
            return None;
        }
        let count = self.hop.min(self.total - self.rendered);
        self.render(count);
        self.rendered += count;
        Some(self.analyzer.frame(&self.history, self.sample_rate as f64))
    }

    fn is_exhausted(&self) -> bool {
        self.rendered >= self.total
    }
}
