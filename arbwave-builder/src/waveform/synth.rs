//! Waveform synthesis: source samples to per-device scratch buffers
//!
//! Each device is synthesized independently, so the devices are spread over
//! the rayon pool and joined before the buffers are returned.

use super::bit_depth::BitDepth;
use super::descriptor::WaveformDescriptor;
use super::scratch::ScratchBuffer;
use super::source::SampleSource;
use crate::error::{BuildError, Result};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Converts a shared source into one quantized scratch buffer per device
pub struct WaveformSynthesizer;

impl WaveformSynthesizer {
    /// Synthesize every device's scratch buffer
    ///
    /// # Arguments
    /// - `descriptor`: channel layout, resolution and device ids
    /// - `source`: interleaved normalized samples, read only
    ///
    /// # Returns
    /// One buffer per device, in device order, each holding
    /// `channels_per_device * sample_count` samples
    ///
    /// # Errors
    /// - Any descriptor validation error (see [`WaveformDescriptor::validate`])
    /// - `InvalidLayout` if the source is shorter than the layout requires
    pub fn synthesize(
        descriptor: &WaveformDescriptor,
        source: &SampleSource,
    ) -> Result<Vec<ScratchBuffer>> {
        let depth = descriptor.validate()?;
        let required = descriptor.required_source_len()?;
        if source.len() < required {
            return Err(BuildError::InvalidLayout(format!(
                "source holds {} samples, layout requires {}",
                source.len(),
                required
            )));
        }

        debug!(
            "Synthesizing {} device(s): {} channel(s) x {} samples at {} bits",
            descriptor.device_count(),
            descriptor.channels_per_device,
            descriptor.sample_count,
            depth.bits()
        );

        if descriptor.has_aliased_slots() {
            warn!(
                "Two devices with {} channels each share source slots: device 0 channel c+1 \
                 reads the same sample as device 1 channel c, the last slot of each step is unused",
                descriptor.channels_per_device
            );
        }

        (0..descriptor.device_count())
            .into_par_iter()
            .map(|device| Self::synthesize_device(descriptor, depth, source.as_slice(), device))
            .collect::<Result<Vec<_>>>()
    }

    /// Accumulate and quantize one device
    ///
    /// Caller has already checked that every index read is in bounds.
    fn synthesize_device(
        descriptor: &WaveformDescriptor,
        depth: BitDepth,
        source: &[f64],
        device: usize,
    ) -> Result<ScratchBuffer> {
        let channels = descriptor.channels_per_device;
        let amplitude = depth.amplitude();
        let mut accumulator = vec![0.0f64; channels * descriptor.sample_count];

        for channel in 0..channels {
            for n in 0..descriptor.sample_count {
                let sample = source[descriptor.source_index(device, channel, n)?];
                accumulator[n * channels + channel] += amplitude * sample;
            }
        }

        let samples = accumulator
            .into_iter()
            .map(|value| depth.quantize(value))
            .collect();

        Ok(ScratchBuffer::new(depth.width(), samples))
    }
}
