//! Data packet framing
//!
//! ## Packet Format
//!
//! All multi-byte fields are little-endian.
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0x00    2B    packet type tag (0x5644, signal data with stream id)
//! 0x02    1B    sample width in bytes (1, 2, 4)
//! 0x03    1B    flags (bit 0 = trailer present)
//! 0x04    4B    packet size in 32-bit words (header + padded payload + trailer)
//! 0x08    4B    stream id
//! 0x0C    4B    packet count (sequence number)
//! 0x10    4B    payload sample count
//! 0x14    ...   payload samples, zero padded to a 32-bit boundary
//! end-4   4B    trailer word
//! ```
//!
//! ## Trailer Word
//!
//! ```text
//! Bit 30:  valid-data enable
//! Bit 18:  valid-data indicator
//! ```

use crate::error::{BuildError, Result};
use crate::waveform::SampleWidth;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Packet type tag for signal data carrying a stream id
pub const PACKET_TYPE_SIGNAL_DATA: u16 = 0x5644;

/// Header size in bytes
pub const HEADER_BYTES: usize = 20;

/// Trailer size in bytes
pub const TRAILER_BYTES: usize = 4;

/// Header flag: a trailer word follows the payload
pub const FLAG_TRAILER_PRESENT: u8 = 0x01;

/// Trailer valid-data enable bit
pub const TRAILER_VALID_DATA_ENABLE: u32 = 1 << 30;

/// Trailer valid-data indicator bit
pub const TRAILER_VALID_DATA: u32 = 1 << 18;

const HEADER_WORDS: usize = HEADER_BYTES / 4;
const TRAILER_WORDS: usize = TRAILER_BYTES / 4;

/// Data packet header (20 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketHeader {
    /// Packet type tag
    pub packet_type: u16,

    /// Sample width in bytes
    pub sample_width: u8,

    /// Flag bits
    pub flags: u8,

    /// Whole packet size in 32-bit words
    pub size_words: u32,

    /// Target device stream id
    pub stream_id: u32,

    /// Sequence number, shared by all devices at one chunk offset
    pub packet_count: u32,

    /// Payload length in samples (before padding)
    pub payload_samples: u32,
}

impl PacketHeader {
    /// Header size in bytes
    pub const SIZE: usize = HEADER_BYTES;

    /// Reset every field to zero
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Stamp type, width, flags, size and payload length
    ///
    /// Stream id and packet count are left untouched.
    ///
    /// # Errors
    /// `FramingError` if the packet size in words or the payload length does
    /// not fit its 32-bit field.
    pub fn init(&mut self, payload_samples: usize, width: SampleWidth) -> Result<()> {
        let size_words = packet_size_words(payload_samples, width)?;
        let payload_samples = u32::try_from(payload_samples).map_err(|_| {
            BuildError::FramingError(format!(
                "payload of {} samples exceeds the 32-bit length field",
                payload_samples
            ))
        })?;

        self.packet_type = PACKET_TYPE_SIGNAL_DATA;
        self.sample_width = width.bytes() as u8;
        self.flags = FLAG_TRAILER_PRESENT;
        self.size_words = size_words;
        self.payload_samples = payload_samples;
        Ok(())
    }

    /// Encode to wire format
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.packet_type)?;
        writer.write_u8(self.sample_width)?;
        writer.write_u8(self.flags)?;
        writer.write_u32::<LittleEndian>(self.size_words)?;
        writer.write_u32::<LittleEndian>(self.stream_id)?;
        writer.write_u32::<LittleEndian>(self.packet_count)?;
        writer.write_u32::<LittleEndian>(self.payload_samples)?;
        Ok(())
    }

    /// Decode from wire format
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            packet_type: reader.read_u16::<LittleEndian>()?,
            sample_width: reader.read_u8()?,
            flags: reader.read_u8()?,
            size_words: reader.read_u32::<LittleEndian>()?,
            stream_id: reader.read_u32::<LittleEndian>()?,
            packet_count: reader.read_u32::<LittleEndian>()?,
            payload_samples: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Data packet trailer (one 32-bit word)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketTrailer {
    pub word: u32,
}

impl PacketTrailer {
    /// Trailer size in bytes
    pub const SIZE: usize = TRAILER_BYTES;

    pub fn clear(&mut self) {
        self.word = 0;
    }

    /// Mark the payload as valid data
    pub fn init(&mut self) {
        self.word = TRAILER_VALID_DATA_ENABLE | TRAILER_VALID_DATA;
    }

    pub fn is_valid(&self) -> bool {
        self.word & (TRAILER_VALID_DATA_ENABLE | TRAILER_VALID_DATA)
            == (TRAILER_VALID_DATA_ENABLE | TRAILER_VALID_DATA)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.word)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            word: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Whole packet size in 32-bit words for a payload of `payload_samples`
pub fn packet_size_words(payload_samples: usize, width: SampleWidth) -> Result<u32> {
    width
        .padded_bytes(payload_samples)
        .and_then(|bytes| (bytes / 4).checked_add(HEADER_WORDS + TRAILER_WORDS))
        .and_then(|words| u32::try_from(words).ok())
        .ok_or_else(|| {
            BuildError::FramingError(format!(
                "packet with {} samples of {} bytes exceeds the 32-bit size field",
                payload_samples,
                width.bytes()
            ))
        })
}

/// One data packet over a borrowed run of scratch samples
///
/// A new packet starts with a cleared header and trailer; both must be
/// initialized before the packet can be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet<'a> {
    header: PacketHeader,
    trailer: PacketTrailer,
    width: SampleWidth,
    payload: &'a [i32],
}

impl<'a> Packet<'a> {
    pub fn new(width: SampleWidth, payload: &'a [i32]) -> Self {
        Self {
            header: PacketHeader::default(),
            trailer: PacketTrailer::default(),
            width,
            payload,
        }
    }

    pub fn clear_header(&mut self) {
        self.header.clear();
    }

    pub fn init_header(&mut self) -> Result<()> {
        self.header.init(self.payload.len(), self.width)
    }

    pub fn clear_trailer(&mut self) {
        self.trailer.clear();
    }

    pub fn init_trailer(&mut self) {
        self.trailer.init();
    }

    pub fn set_stream_id(&mut self, stream_id: u32) {
        self.header.stream_id = stream_id;
    }

    pub fn set_packet_count(&mut self, packet_count: u32) {
        self.header.packet_count = packet_count;
    }

    pub fn header(&self) -> &PacketHeader {
        &self.header
    }

    pub fn trailer(&self) -> &PacketTrailer {
        &self.trailer
    }

    pub fn payload(&self) -> &'a [i32] {
        self.payload
    }

    /// Encoded size in bytes as declared by the header
    pub fn encoded_len(&self) -> usize {
        self.header.size_words as usize * 4
    }

    /// Append the framed packet to `out`
    ///
    /// Nothing is written unless the header and trailer describe this
    /// payload.
    ///
    /// # Errors
    /// `FramingError` if the header is uninitialized or stale, or the trailer
    /// is not marked valid.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        self.validate_framing()?;

        let start = out.len();
        out.reserve(self.encoded_len());
        self.header.write_to(out).map_err(encode_error)?;
        for &sample in self.payload {
            self.width.write_sample(out, sample).map_err(encode_error)?;
        }
        while (out.len() - start) % 4 != 0 {
            out.push(0);
        }
        self.trailer.write_to(out).map_err(encode_error)?;

        debug_assert_eq!(out.len() - start, self.encoded_len());
        Ok(())
    }

    /// Check that header and trailer describe this payload
    pub fn validate_framing(&self) -> Result<()> {
        if self.header.packet_type != PACKET_TYPE_SIGNAL_DATA {
            return Err(BuildError::FramingError(
                "packet header was not initialized".to_string(),
            ));
        }
        let expected_words = packet_size_words(self.payload.len(), self.width)?;
        if self.header.size_words != expected_words
            || self.header.payload_samples as usize != self.payload.len()
            || self.header.sample_width as usize != self.width.bytes()
        {
            return Err(BuildError::FramingError(format!(
                "header declares {} words / {} samples, payload needs {} words / {} samples",
                self.header.size_words,
                self.header.payload_samples,
                expected_words,
                self.payload.len()
            )));
        }
        if !self.trailer.is_valid() {
            return Err(BuildError::FramingError(
                "packet trailer was not initialized".to_string(),
            ));
        }
        Ok(())
    }
}

fn encode_error(e: io::Error) -> BuildError {
    BuildError::FramingError(format!("packet encode failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(payload: &[i32], width: SampleWidth) -> Packet<'_> {
        let mut packet = Packet::new(width, payload);
        packet.clear_header();
        packet.clear_trailer();
        packet.init_header().unwrap();
        packet.init_trailer();
        packet
    }

    #[test]
    fn test_header_layout() {
        let payload = [1, -1, 2];
        let mut packet = framed(&payload, SampleWidth::Short);
        packet.set_stream_id(0x0102_0304);
        packet.set_packet_count(7);

        let mut bytes = Vec::new();
        packet.encode_into(&mut bytes).unwrap();

        // 5 header words + 2 payload words (3 shorts padded) + 1 trailer word
        assert_eq!(bytes.len(), 32);
        assert_eq!(packet.encoded_len(), 32);
        assert_eq!(&bytes[0..2], &[0x44, 0x56]);
        assert_eq!(bytes[2], 2);
        assert_eq!(bytes[3], FLAG_TRAILER_PRESENT);
        assert_eq!(&bytes[4..8], &8u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[12..16], &7u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &3u32.to_le_bytes());
        assert_eq!(&bytes[20..28], &[0x01, 0x00, 0xFF, 0xFF, 0x02, 0x00, 0x00, 0x00]);
        assert_eq!(
            &bytes[28..32],
            &(TRAILER_VALID_DATA_ENABLE | TRAILER_VALID_DATA).to_le_bytes()
        );
    }

    #[test]
    fn test_empty_payload_is_well_formed() {
        let packet = framed(&[], SampleWidth::Word);
        let mut bytes = Vec::new();
        packet.encode_into(&mut bytes).unwrap();

        assert_eq!(bytes.len(), HEADER_BYTES + TRAILER_BYTES);
        assert_eq!(packet.header().size_words, 6);
        assert_eq!(packet.header().payload_samples, 0);
    }

    #[test]
    fn test_uninitialized_header_rejected() {
        let payload = [1, 2];
        let mut packet = Packet::new(SampleWidth::Short, &payload);
        packet.init_trailer();

        let mut bytes = Vec::new();
        let result = packet.encode_into(&mut bytes);
        assert!(matches!(result, Err(BuildError::FramingError(_))));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_cleared_trailer_rejected() {
        let payload = [1, 2];
        let mut packet = framed(&payload, SampleWidth::Short);
        packet.clear_trailer();

        let mut bytes = Vec::new();
        assert!(packet.encode_into(&mut bytes).is_err());
    }

    #[test]
    fn test_header_read_back() {
        let payload = [5; 4];
        let mut packet = framed(&payload, SampleWidth::Byte);
        packet.set_stream_id(3);
        packet.set_packet_count(2);

        let mut bytes = Vec::new();
        packet.encode_into(&mut bytes).unwrap();

        let header = PacketHeader::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(&header, packet.header());
    }

    #[test]
    fn test_size_field_overflow() {
        let result = packet_size_words(usize::MAX / 2, SampleWidth::Word);
        assert!(matches!(result, Err(BuildError::FramingError(_))));
    }
}
