//! Per-device quantized sample buffer

use super::bit_depth::SampleWidth;
use std::ops::Range;

/// Quantized samples for one device, channel-interleaved
///
/// The sample for channel `c` at time `n` lives at `n * channels + c`.
/// Values are held widened to `i32` but always fit `width` (and the
/// configured resolution). Allocated fresh by every build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchBuffer {
    width: SampleWidth,
    samples: Vec<i32>,
}

impl ScratchBuffer {
    pub fn new(width: SampleWidth, samples: Vec<i32>) -> Self {
        Self { width, samples }
    }

    pub fn width(&self) -> SampleWidth {
        self.width
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Borrow a run of samples, as taken by one chunk
    pub fn slice(&self, range: Range<usize>) -> &[i32] {
        &self.samples[range]
    }
}
