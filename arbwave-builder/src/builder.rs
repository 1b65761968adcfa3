//! Build entry point: source waveform to outbound packet stream
//!
//! `build` runs synthesis, chunking and assembly in one synchronous call. No
//! state survives between calls; scratch buffers live only inside the call.

use crate::assembler::OutboundBuffer;
use crate::chunker::PacketChunker;
use crate::error::Result;
use crate::waveform::{SampleSource, WaveformDescriptor, WaveformSynthesizer};
use arbwave_common::BuilderSettings;
use tracing::info;

/// Build with default packer framing
///
/// # Errors
/// Any [`crate::BuildError`]; a failed build returns no buffer.
pub fn build(
    descriptor: &WaveformDescriptor,
    source: &SampleSource,
    max_chunk_words: usize,
) -> Result<OutboundBuffer> {
    WaveBuilder::new(max_chunk_words).build(descriptor, source)
}

/// Reusable build configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveBuilder {
    max_chunk_words: usize,
    frame_capacity_words: usize,
}

impl WaveBuilder {
    pub fn new(max_chunk_words: usize) -> Self {
        Self {
            max_chunk_words,
            frame_capacity_words: 0,
        }
    }

    pub fn from_settings(settings: &BuilderSettings) -> Self {
        Self::new(settings.max_chunk_words).with_frame_capacity(settings.frame_capacity_words)
    }

    /// Bound packer output frames (0 = unbounded); does not change the bytes
    pub fn with_frame_capacity(mut self, frame_capacity_words: usize) -> Self {
        self.frame_capacity_words = frame_capacity_words;
        self
    }

    pub fn max_chunk_words(&self) -> usize {
        self.max_chunk_words
    }

    /// Synthesize, chunk and assemble one waveform
    pub fn build(
        &self,
        descriptor: &WaveformDescriptor,
        source: &SampleSource,
    ) -> Result<OutboundBuffer> {
        let chunker =
            PacketChunker::new(self.max_chunk_words)?.with_frame_capacity(self.frame_capacity_words);

        let scratch = WaveformSynthesizer::synthesize(descriptor, source)?;
        let outbound = chunker.chunk(&scratch, &descriptor.device_stream_ids)?;

        info!(
            "Built waveform: {} device(s), {} packets, {} payload samples, {} bytes",
            descriptor.device_count(),
            outbound.packet_count(),
            outbound.payload_words(),
            outbound.len_bytes()
        );
        Ok(outbound)
    }
}
