//! Caller-supplied waveform samples
//!
//! Samples are normalized floats (nominally -1.0 to 1.0) laid out per the
//! interleaving contract in [`super::descriptor`]. The build pipeline only
//! reads the source; padding happens beforehand, when the caller loads it.

use tracing::debug;

/// Ordered sequence of normalized waveform samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSource {
    samples: Vec<f64>,
}

impl SampleSource {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append zeros until the length is a multiple of `granularity`
    ///
    /// The DAC consumes whole trigger frames, so a partial last frame is
    /// completed with silence. A granularity of 0 or 1 is a no-op.
    ///
    /// # Returns
    /// Number of zero samples appended
    pub fn pad_to_granularity(&mut self, granularity: usize) -> usize {
        if granularity <= 1 {
            return 0;
        }
        let remainder = self.samples.len() % granularity;
        if remainder == 0 {
            return 0;
        }
        let pad = granularity - remainder;
        self.samples.resize(self.samples.len() + pad, 0.0);
        debug!(
            "Padded source with {} zero samples to granularity {}",
            pad, granularity
        );
        pad
    }

    /// Time indices held when each one spans `slots_per_event` source slots
    pub fn events(&self, slots_per_event: usize) -> usize {
        if slots_per_event == 0 {
            return 0;
        }
        self.samples.len() / slots_per_event
    }
}

impl From<Vec<f64>> for SampleSource {
    fn from(samples: Vec<f64>) -> Self {
        Self::new(samples)
    }
}
