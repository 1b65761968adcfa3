//! Output channel topology
//!
//! The board has four DAC outputs served by two devices: device 0 owns
//! outputs 0 and 1, device 1 owns outputs 2 and 3. A device takes part in a
//! build when at least one of its outputs is enabled.

use crate::error::{BuildError, Result};
use crate::waveform::{SampleSource, WaveformDescriptor};
use arbwave_common::BuilderSettings;

/// DAC outputs on the board
pub const OUTPUT_CHANNELS: usize = 4;

/// Outputs served by each device
pub const OUTPUTS_PER_DEVICE: usize = 2;

/// Which outputs are enabled and how each device is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTopology {
    pub enabled: [bool; OUTPUT_CHANNELS],
    pub stream_ids: [u32; OUTPUT_CHANNELS / OUTPUTS_PER_DEVICE],
}

impl ChannelTopology {
    pub fn new(
        enabled: [bool; OUTPUT_CHANNELS],
        stream_ids: [u32; OUTPUT_CHANNELS / OUTPUTS_PER_DEVICE],
    ) -> Self {
        Self {
            enabled,
            stream_ids,
        }
    }

    pub fn from_settings(settings: &BuilderSettings) -> Self {
        Self::new(settings.enabled_channels, settings.stream_ids)
    }

    /// Number of enabled outputs
    pub fn active_channels(&self) -> usize {
        self.enabled.iter().filter(|&&on| on).count()
    }

    /// Stream ids of the devices with an enabled output, in device order
    pub fn device_stream_ids(&self) -> Vec<u32> {
        self.stream_ids
            .iter()
            .enumerate()
            .filter(|(device, _)| {
                let first = device * OUTPUTS_PER_DEVICE;
                self.enabled[first..first + OUTPUTS_PER_DEVICE]
                    .iter()
                    .any(|&on| on)
            })
            .map(|(_, &sid)| sid)
            .collect()
    }

    /// Active outputs divided evenly over the active devices
    pub fn channels_per_device(&self) -> usize {
        match self.device_stream_ids().len() {
            0 => self.active_channels(),
            devices => self.active_channels() / devices,
        }
    }

    /// Per-device tags sent with pattern commands (the device index)
    pub fn tags(&self) -> Vec<u8> {
        (0..self.device_stream_ids().len()).map(|i| i as u8).collect()
    }

    /// Describe a build of `source` on this topology
    ///
    /// Every time index spans two device slots of `channels_per_device`
    /// samples each, whether or not the second device is enabled, so the
    /// per-channel sample count is the source length over that stride.
    ///
    /// # Errors
    /// `EmptyTopology` when no output is enabled
    pub fn descriptor(&self, bit_depth: u32, source: &SampleSource) -> Result<WaveformDescriptor> {
        if self.active_channels() == 0 {
            return Err(BuildError::EmptyTopology(
                "no output channels enabled".to_string(),
            ));
        }
        Ok(WaveformDescriptor::new(
            self.channels_per_device(),
            bit_depth,
            source.events(self.channels_per_device() * OUTPUTS_PER_DEVICE),
            self.device_stream_ids(),
        ))
    }
}
