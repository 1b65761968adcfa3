//! Outbound container header
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0x00    4B    container tag (bytes "VELO")
//! 0x04    4B    container size in 32-bit words, including this header
//! 0x08    4B    number of data packets
//! 0x0C    4B    reserved (zero)
//! ```
//!
//! The header is reserved as a zeroed placeholder before any packet bytes
//! are appended and patched once the body is complete.

use crate::error::{BuildError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};

/// Container tag, "VELO" in wire byte order
pub const CONTAINER_TAG: u32 = 0x4F4C_4556;

/// Container header size in bytes
pub const CONTAINER_HEADER_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerHeader {
    pub tag: u32,
    pub size_words: u32,
    pub packet_count: u32,
}

impl ContainerHeader {
    pub const SIZE: usize = CONTAINER_HEADER_BYTES;

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Stamp tag, total size and packet count
    ///
    /// # Errors
    /// `FramingError` if the total is not whole 32-bit words or a field
    /// overflows.
    pub fn init(&mut self, total_bytes: usize, packet_count: usize) -> Result<()> {
        if total_bytes % 4 != 0 {
            return Err(BuildError::FramingError(format!(
                "container of {} bytes is not 32-bit aligned",
                total_bytes
            )));
        }
        let size_words = u32::try_from(total_bytes / 4).map_err(|_| {
            BuildError::FramingError(format!(
                "container of {} bytes exceeds the 32-bit size field",
                total_bytes
            ))
        })?;
        let packet_count = u32::try_from(packet_count).map_err(|_| {
            BuildError::FramingError(format!("{} packets exceed the count field", packet_count))
        })?;

        self.tag = CONTAINER_TAG;
        self.size_words = size_words;
        self.packet_count = packet_count;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.tag)?;
        writer.write_u32::<LittleEndian>(self.size_words)?;
        writer.write_u32::<LittleEndian>(self.packet_count)?;
        writer.write_u32::<LittleEndian>(0)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let header = Self {
            tag: reader.read_u32::<LittleEndian>()?,
            size_words: reader.read_u32::<LittleEndian>()?,
            packet_count: reader.read_u32::<LittleEndian>()?,
        };
        let _reserved = reader.read_u32::<LittleEndian>()?;
        Ok(header)
    }
}

/// Append a zeroed container header to be patched by [`fill_header`]
pub fn header_placeholder(buffer: &mut Vec<u8>) {
    buffer.extend_from_slice(&[0u8; CONTAINER_HEADER_BYTES]);
}

/// Patch the container header at the start of `buffer`
///
/// Size is taken from the whole buffer, so this must run after the last
/// packet has been appended.
pub fn fill_header(buffer: &mut [u8], packet_count: usize) -> Result<()> {
    if buffer.len() < CONTAINER_HEADER_BYTES {
        return Err(BuildError::FramingError(
            "buffer has no room for the container header".to_string(),
        ));
    }

    let mut header = ContainerHeader::default();
    header.clear();
    header.init(buffer.len(), packet_count)?;

    let mut cursor = Cursor::new(&mut buffer[..CONTAINER_HEADER_BYTES]);
    header
        .write_to(&mut cursor)
        .map_err(|e| BuildError::FramingError(format!("container header write failed: {}", e)))
}
