//! Waveform descriptor and the source interleaving contract
//!
//! # Source layout
//!
//! The source array is shared by both devices. The sample for device `d`,
//! channel `c`, time index `n` is read from
//!
//! ```text
//! n * (2 * channels_per_device) + d + c
//! ```
//!
//! Device and channel offsets are added, not multiplied. This is the layout
//! the board firmware tools produce and it is kept as is; it is only
//! well-defined for at most two devices, which [`WaveformDescriptor::validate`]
//! enforces.

use super::bit_depth::BitDepth;
use crate::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Devices that can share one source array under the additive layout
pub const MAX_DEVICES: usize = 2;

/// Shape of one build: channel layout, resolution, length and device ids
///
/// Immutable for the duration of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveformDescriptor {
    /// Output channels owned by each device
    pub channels_per_device: usize,

    /// DAC resolution in bits
    pub bit_depth: u32,

    /// Samples per channel
    pub sample_count: usize,

    /// Stream id of each device, in device order
    pub device_stream_ids: Vec<u32>,
}

impl WaveformDescriptor {
    pub fn new(
        channels_per_device: usize,
        bit_depth: u32,
        sample_count: usize,
        device_stream_ids: Vec<u32>,
    ) -> Self {
        Self {
            channels_per_device,
            bit_depth,
            sample_count,
            device_stream_ids,
        }
    }

    pub fn device_count(&self) -> usize {
        self.device_stream_ids.len()
    }

    /// Distance between consecutive time indices in the source array
    pub fn source_stride(&self) -> Result<usize> {
        self.channels_per_device.checked_mul(2).ok_or_else(|| {
            BuildError::InvalidLayout(format!(
                "stride of {} channels per device overflows",
                self.channels_per_device
            ))
        })
    }

    /// Source index of one device/channel/time sample
    pub fn source_index(&self, device: usize, channel: usize, n: usize) -> Result<usize> {
        n.checked_mul(self.source_stride()?)
            .and_then(|base| base.checked_add(device))
            .and_then(|base| base.checked_add(channel))
            .ok_or_else(|| {
                BuildError::InvalidLayout(format!(
                    "source index of device {} channel {} sample {} overflows",
                    device, channel, n
                ))
            })
    }

    /// Whether two devices read overlapping source slots
    ///
    /// With two devices and more than one channel each, the additive index
    /// makes device 0 channel `c + 1` and device 1 channel `c` share a slot,
    /// and the last slot of each time step is never read.
    pub fn has_aliased_slots(&self) -> bool {
        self.device_count() == MAX_DEVICES && self.channels_per_device > 1
    }

    /// Samples held by each device's scratch buffer
    pub fn scratch_len(&self) -> Result<usize> {
        self.channels_per_device
            .checked_mul(self.sample_count)
            .ok_or_else(|| {
                BuildError::InvalidLayout(format!(
                    "{} channels x {} samples overflows",
                    self.channels_per_device, self.sample_count
                ))
            })
    }

    /// Minimum source length required by the interleaving contract
    pub fn required_source_len(&self) -> Result<usize> {
        let stride = self.source_stride()?;
        self.sample_count.checked_mul(stride).ok_or_else(|| {
            BuildError::InvalidLayout(format!(
                "{} samples x stride {} overflows",
                self.sample_count, stride
            ))
        })
    }

    /// Check every precondition of a build and return the parsed bit depth
    ///
    /// # Errors
    /// - `EmptyTopology` when there are no devices or no channels
    /// - `UnsupportedBitDepth` for a resolution outside 1..=32
    /// - `InvalidLayout` for more than two devices, repeated stream ids, or a
    ///   zero sample count
    pub fn validate(&self) -> Result<BitDepth> {
        if self.device_stream_ids.is_empty() {
            return Err(BuildError::EmptyTopology("no devices".to_string()));
        }
        if self.channels_per_device == 0 {
            return Err(BuildError::EmptyTopology(
                "zero channels per device".to_string(),
            ));
        }

        let depth = BitDepth::new(self.bit_depth)?;

        if self.device_count() > MAX_DEVICES {
            return Err(BuildError::InvalidLayout(format!(
                "{} devices requested, the shared source layout supports at most {}",
                self.device_count(),
                MAX_DEVICES
            )));
        }

        let unique: HashSet<u32> = self.device_stream_ids.iter().copied().collect();
        if unique.len() != self.device_stream_ids.len() {
            return Err(BuildError::InvalidLayout(format!(
                "duplicate stream ids {:?}",
                self.device_stream_ids
            )));
        }

        if self.sample_count == 0 {
            return Err(BuildError::InvalidLayout(
                "sample count must be positive".to_string(),
            ));
        }

        self.scratch_len()?;
        self.required_source_len()?;
        Ok(depth)
    }
}
