//! Outbound buffer inspection
//!
//! Walks a finished container and decodes every data packet, checking tags,
//! sizes and trailers along the way.

use crate::error::{BuildError, Result};
use crate::framing::container::{ContainerHeader, CONTAINER_TAG};
use crate::framing::packet::{packet_size_words, PacketHeader, PacketTrailer, PACKET_TYPE_SIGNAL_DATA};
use crate::waveform::SampleWidth;
use std::io::{self, Cursor};

/// One data packet read back from an outbound buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    pub header: PacketHeader,
    pub trailer: PacketTrailer,
    pub samples: Vec<i32>,
}

impl DecodedPacket {
    pub fn stream_id(&self) -> u32 {
        self.header.stream_id
    }

    pub fn sequence(&self) -> u32 {
        self.header.packet_count
    }
}

/// Decode every data packet in an outbound container
///
/// # Errors
/// `FramingError` for a wrong tag, inconsistent size field, truncated packet,
/// invalid trailer, or a packet count that disagrees with the container
/// header.
pub fn parse_outbound(bytes: &[u8]) -> Result<Vec<DecodedPacket>> {
    let mut cursor = Cursor::new(bytes);
    let container = ContainerHeader::read_from(&mut cursor).map_err(truncated)?;

    if container.tag != CONTAINER_TAG {
        return Err(BuildError::FramingError(format!(
            "bad container tag {:#010x}",
            container.tag
        )));
    }
    if container.size_words as usize * 4 != bytes.len() {
        return Err(BuildError::FramingError(format!(
            "container declares {} words, buffer holds {} bytes",
            container.size_words,
            bytes.len()
        )));
    }

    let mut packets = Vec::with_capacity(container.packet_count as usize);
    while (cursor.position() as usize) < bytes.len() {
        packets.push(read_packet(&mut cursor, bytes.len())?);
    }

    if packets.len() != container.packet_count as usize {
        return Err(BuildError::FramingError(format!(
            "container declares {} packets, found {}",
            container.packet_count,
            packets.len()
        )));
    }
    Ok(packets)
}

fn read_packet(cursor: &mut Cursor<&[u8]>, total: usize) -> Result<DecodedPacket> {
    let start = cursor.position() as usize;
    let header = PacketHeader::read_from(cursor).map_err(truncated)?;

    if header.packet_type != PACKET_TYPE_SIGNAL_DATA {
        return Err(BuildError::FramingError(format!(
            "bad packet type {:#06x} at byte {}",
            header.packet_type, start
        )));
    }
    let width = SampleWidth::from_bytes(header.sample_width).ok_or_else(|| {
        BuildError::FramingError(format!("bad sample width {}", header.sample_width))
    })?;
    let expected = packet_size_words(header.payload_samples as usize, width)?;
    if header.size_words != expected {
        return Err(BuildError::FramingError(format!(
            "packet at byte {} declares {} words, payload needs {}",
            start, header.size_words, expected
        )));
    }
    let end = start + header.size_words as usize * 4;
    if end > total {
        return Err(BuildError::FramingError(format!(
            "packet at byte {} runs past the end of the buffer",
            start
        )));
    }

    let mut samples = Vec::with_capacity(header.payload_samples as usize);
    for _ in 0..header.payload_samples {
        samples.push(width.read_sample(cursor).map_err(truncated)?);
    }

    cursor.set_position((end - PacketTrailer::SIZE) as u64);
    let trailer = PacketTrailer::read_from(cursor).map_err(truncated)?;
    if !trailer.is_valid() {
        return Err(BuildError::FramingError(format!(
            "packet at byte {} has an invalid trailer {:#010x}",
            start, trailer.word
        )));
    }

    Ok(DecodedPacket {
        header,
        trailer,
        samples,
    })
}

fn truncated(e: io::Error) -> BuildError {
    BuildError::FramingError(format!("truncated buffer: {}", e))
}
