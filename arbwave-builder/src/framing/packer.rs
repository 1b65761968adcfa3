//! Streaming packet packer
//!
//! Packets are appended to an open output frame. When the next packet would
//! push the frame past its capacity the frame is completed and queued; a
//! packet larger than the capacity gets a frame of its own. Completed frames
//! are handed out only by [`PacketPacker::drain`] and [`PacketPacker::flush`],
//! so "packet packed" and "bytes available" are separate events. Callers must
//! flush before reading the final bytes.

use super::packet::Packet;
use crate::error::Result;
use std::collections::VecDeque;
use tracing::trace;

/// One completed output frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedFrame {
    bytes: Vec<u8>,
    packets: usize,
}

impl PackedFrame {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of data packets in this frame
    pub fn packets(&self) -> usize {
        self.packets
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Accumulates framed packets into bounded output frames
#[derive(Debug)]
pub struct PacketPacker {
    /// Frame capacity in bytes, `None` for a single unbounded frame
    capacity_bytes: Option<usize>,
    open: PackedFrame,
    ready: VecDeque<PackedFrame>,
    packed: usize,
}

impl PacketPacker {
    /// Create a packer whose frames hold up to `frame_capacity_words` 32-bit
    /// words (0 = unbounded)
    pub fn new(frame_capacity_words: usize) -> Self {
        let capacity_bytes = match frame_capacity_words {
            0 => None,
            words => Some(words.saturating_mul(4)),
        };
        Self {
            capacity_bytes,
            open: PackedFrame::default(),
            ready: VecDeque::new(),
            packed: 0,
        }
    }

    /// Enqueue one framed packet
    ///
    /// # Errors
    /// `FramingError` if the packet's header or trailer does not describe
    /// its payload. The packer is unchanged in that case.
    pub fn pack(&mut self, packet: &Packet<'_>) -> Result<()> {
        packet.validate_framing()?;

        if let Some(capacity) = self.capacity_bytes {
            if !self.open.is_empty() && self.open.len() + packet.encoded_len() > capacity {
                self.complete_open();
            }
        }

        packet.encode_into(&mut self.open.bytes)?;
        self.open.packets += 1;
        self.packed += 1;

        if let Some(capacity) = self.capacity_bytes {
            if self.open.len() >= capacity {
                self.complete_open();
            }
        }
        Ok(())
    }

    /// Take every completed frame, leaving the open frame in place
    pub fn drain(&mut self) -> Vec<PackedFrame> {
        self.ready.drain(..).collect()
    }

    /// Complete the open frame and take every remaining frame
    pub fn flush(&mut self) -> Vec<PackedFrame> {
        if !self.open.is_empty() {
            self.complete_open();
        }
        self.drain()
    }

    /// Packets accepted since creation
    pub fn packed(&self) -> usize {
        self.packed
    }

    fn complete_open(&mut self) {
        let frame = std::mem::take(&mut self.open);
        trace!(
            "Completed packer frame: {} bytes, {} packets",
            frame.len(),
            frame.packets()
        );
        self.ready.push_back(frame);
    }
}
