//! Packet chunking
//!
//! Splits every device's scratch buffer into runs of at most
//! `max_chunk_words` samples and frames each run as one data packet. Devices
//! are visited round-robin per chunk offset, so all packets covering the same
//! offset share one sequence number and differ only in stream id.

use crate::assembler::{OutboundBuffer, OutputAssembler, PacketSummary};
use crate::error::{BuildError, Result};
use crate::framing::{Packet, PacketPacker, CONTAINER_HEADER_BYTES};
use crate::waveform::ScratchBuffer;
use tracing::debug;

/// Frames scratch buffers into a bounded packet stream
#[derive(Debug, Clone, Copy)]
pub struct PacketChunker {
    max_chunk_words: usize,
    frame_capacity_words: usize,
}

impl PacketChunker {
    /// # Errors
    /// `ChunkOverflow` if `max_chunk_words` is zero
    pub fn new(max_chunk_words: usize) -> Result<Self> {
        if max_chunk_words == 0 {
            return Err(BuildError::ChunkOverflow(max_chunk_words));
        }
        Ok(Self {
            max_chunk_words,
            frame_capacity_words: 0,
        })
    }

    /// Bound the packer's output frames (0 = unbounded)
    pub fn with_frame_capacity(mut self, frame_capacity_words: usize) -> Self {
        self.frame_capacity_words = frame_capacity_words;
        self
    }

    pub fn max_chunk_words(&self) -> usize {
        self.max_chunk_words
    }

    /// Chunk, frame and pack every device's scratch buffer
    ///
    /// # Arguments
    /// - `scratch`: one buffer per device, all the same length and width
    /// - `stream_ids`: stream id of each device, same order as `scratch`
    ///
    /// # Errors
    /// - `EmptyTopology` if there are no buffers
    /// - `InvalidLayout` if buffers and stream ids disagree in count, or the
    ///   buffers are not uniform
    /// - `FramingError` from the packet codec
    pub fn chunk(&self, scratch: &[ScratchBuffer], stream_ids: &[u32]) -> Result<OutboundBuffer> {
        let first = scratch
            .first()
            .ok_or_else(|| BuildError::EmptyTopology("no scratch buffers".to_string()))?;
        if scratch.len() != stream_ids.len() {
            return Err(BuildError::InvalidLayout(format!(
                "{} scratch buffers for {} stream ids",
                scratch.len(),
                stream_ids.len()
            )));
        }
        if let Some(odd) = scratch
            .iter()
            .find(|b| b.len() != first.len() || b.width() != first.width())
        {
            return Err(BuildError::InvalidLayout(format!(
                "scratch buffers differ: {} samples of {} bytes vs {} samples of {} bytes",
                first.len(),
                first.width().bytes(),
                odd.len(),
                odd.width().bytes()
            )));
        }

        let width = first.width();
        let mut packer = PacketPacker::new(self.frame_capacity_words);
        let mut frames = Vec::new();
        let mut manifest = Vec::new();
        let mut byte_offset = CONTAINER_HEADER_BYTES;

        let mut words_remaining = first.len();
        let mut offset = 0usize;
        let mut sequence = 0u32;

        while words_remaining > 0 {
            let chunk_size = self.max_chunk_words.min(words_remaining);

            for (buffer, &stream_id) in scratch.iter().zip(stream_ids) {
                let mut packet = Packet::new(width, buffer.slice(offset..offset + chunk_size));
                packet.clear_header();
                packet.clear_trailer();
                packet.init_header()?;
                packet.init_trailer();
                packet.set_stream_id(stream_id);
                packet.set_packet_count(sequence);

                packer.pack(&packet)?;

                manifest.push(PacketSummary {
                    stream_id,
                    sequence,
                    offset,
                    len: chunk_size,
                    byte_offset,
                });
                byte_offset += packet.encoded_len();
            }

            frames.extend(packer.drain());

            words_remaining -= chunk_size;
            offset += chunk_size;
            sequence = sequence.checked_add(1).ok_or_else(|| {
                BuildError::FramingError("sequence number exceeds 32 bits".to_string())
            })?;
        }

        frames.extend(packer.flush());

        debug!(
            "Chunked {} device(s) x {} samples into {} chunk(s) of at most {} samples ({} packets)",
            scratch.len(),
            first.len(),
            sequence,
            self.max_chunk_words,
            packer.packed()
        );

        OutputAssembler::assemble(frames, manifest)
    }
}
