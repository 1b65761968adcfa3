//! Output assembly: container fixup and the caller-facing buffer

use crate::error::{BuildError, Result};
use crate::framing::container;
use crate::framing::PackedFrame;
use serde::Serialize;
use tracing::debug;

/// Where one data packet sits in the outbound buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketSummary {
    /// Target device stream id
    pub stream_id: u32,

    /// Sequence number (chunk index)
    pub sequence: u32,

    /// First scratch sample carried by this packet
    pub offset: usize,

    /// Payload length in samples
    pub len: usize,

    /// Byte position of the packet header in the outbound buffer
    pub byte_offset: usize,
}

/// Diagnostics for one completed build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub packet_count: usize,
    pub payload_words: usize,
    pub bytes: usize,
    pub devices: usize,
    pub chunks: usize,
}

/// Framed packet stream inside one outbound container
///
/// The only artifact a build returns; owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundBuffer {
    bytes: Vec<u8>,
    packets: Vec<PacketSummary>,
}

impl OutboundBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Per-packet manifest in emission order
    pub fn packets(&self) -> &[PacketSummary] {
        &self.packets
    }

    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }

    /// Payload samples across all packets and devices
    pub fn payload_words(&self) -> usize {
        self.packets.iter().map(|p| p.len).sum()
    }

    /// Payload samples carried for one device
    pub fn payload_words_for(&self, stream_id: u32) -> usize {
        self.packets
            .iter()
            .filter(|p| p.stream_id == stream_id)
            .map(|p| p.len)
            .sum()
    }

    pub fn report(&self) -> BuildReport {
        let mut devices: Vec<u32> = self.packets.iter().map(|p| p.stream_id).collect();
        devices.sort_unstable();
        devices.dedup();
        let chunks = self
            .packets
            .iter()
            .map(|p| p.sequence as usize + 1)
            .max()
            .unwrap_or(0);

        BuildReport {
            packet_count: self.packet_count(),
            payload_words: self.payload_words(),
            bytes: self.len_bytes(),
            devices: devices.len(),
            chunks,
        }
    }
}

/// Joins flushed packer frames into one container
pub struct OutputAssembler;

impl OutputAssembler {
    /// Concatenate frames behind a container header and patch it
    ///
    /// # Arguments
    /// - `frames`: every frame drained or flushed from the packer, in order
    /// - `packets`: manifest of the packets inside those frames
    ///
    /// # Errors
    /// `FramingError` if the frames hold a different number of packets than
    /// the manifest lists, or the container header cannot describe the
    /// result.
    pub fn assemble(frames: Vec<PackedFrame>, packets: Vec<PacketSummary>) -> Result<OutboundBuffer> {
        let framed_packets: usize = frames.iter().map(PackedFrame::packets).sum();
        if framed_packets != packets.len() {
            return Err(BuildError::FramingError(format!(
                "packer emitted {} packets, manifest lists {}",
                framed_packets,
                packets.len()
            )));
        }

        let body: usize = frames.iter().map(PackedFrame::len).sum();
        let mut bytes = Vec::with_capacity(container::CONTAINER_HEADER_BYTES + body);
        container::header_placeholder(&mut bytes);
        for frame in &frames {
            bytes.extend_from_slice(frame.bytes());
        }
        container::fill_header(&mut bytes, packets.len())?;

        debug!(
            "Assembled {} frame(s) into {} bytes ({} packets)",
            frames.len(),
            bytes.len(),
            packets.len()
        );

        Ok(OutboundBuffer { bytes, packets })
    }
}
