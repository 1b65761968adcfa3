//! Bit depth and sample width
//!
//! The DAC resolution selects one of three storage widths. Quantization is
//! truncation toward zero followed by a clamp to the signed range of the
//! configured resolution, so no emitted sample ever exceeds what the DAC can
//! represent.

use crate::error::{BuildError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

/// Fraction of full scale used for a unit source sample
///
/// Keeps a 5% margin below full scale so that quantization never clips.
pub const AMPLITUDE_HEADROOM: f64 = 0.95;

/// Widest resolution that fits the 32-bit sample container
pub const MAX_BITS: u32 = 32;

/// Storage width of one quantized sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleWidth {
    /// 1 byte per sample (resolution up to 8 bits)
    Byte,

    /// 2 bytes per sample (resolution up to 16 bits)
    Short,

    /// 4 bytes per sample (resolution up to 32 bits)
    Word,
}

impl SampleWidth {
    /// Select the storage width for a DAC resolution
    pub fn for_bits(bits: u32) -> Result<Self> {
        match bits {
            1..=8 => Ok(SampleWidth::Byte),
            9..=16 => Ok(SampleWidth::Short),
            17..=MAX_BITS => Ok(SampleWidth::Word),
            _ => Err(BuildError::UnsupportedBitDepth(bits)),
        }
    }

    /// Width from the byte count carried in a packet header
    pub fn from_bytes(bytes: u8) -> Option<Self> {
        match bytes {
            1 => Some(SampleWidth::Byte),
            2 => Some(SampleWidth::Short),
            4 => Some(SampleWidth::Word),
            _ => None,
        }
    }

    /// Bytes occupied by one sample
    pub const fn bytes(self) -> usize {
        match self {
            SampleWidth::Byte => 1,
            SampleWidth::Short => 2,
            SampleWidth::Word => 4,
        }
    }

    /// Bytes needed for `samples` samples, rounded up to whole 32-bit words
    pub fn padded_bytes(self, samples: usize) -> Option<usize> {
        let raw = samples.checked_mul(self.bytes())?;
        raw.checked_add(3).map(|n| n & !3)
    }

    /// Write one sample, little-endian, truncated to this width
    pub fn write_sample<W: Write>(self, writer: &mut W, value: i32) -> io::Result<()> {
        match self {
            SampleWidth::Byte => writer.write_i8(value as i8),
            SampleWidth::Short => writer.write_i16::<LittleEndian>(value as i16),
            SampleWidth::Word => writer.write_i32::<LittleEndian>(value),
        }
    }

    /// Read one little-endian sample of this width, sign-extended
    pub fn read_sample<R: Read>(self, reader: &mut R) -> io::Result<i32> {
        match self {
            SampleWidth::Byte => reader.read_i8().map(i32::from),
            SampleWidth::Short => reader.read_i16::<LittleEndian>().map(i32::from),
            SampleWidth::Word => reader.read_i32::<LittleEndian>(),
        }
    }
}

/// Configured DAC resolution together with its storage width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitDepth {
    bits: u32,
    width: SampleWidth,
}

impl BitDepth {
    /// Validate a resolution in bits
    ///
    /// # Errors
    /// `UnsupportedBitDepth` for zero or anything wider than 32 bits.
    pub fn new(bits: u32) -> Result<Self> {
        let width = SampleWidth::for_bits(bits)?;
        Ok(Self { bits, width })
    }

    pub fn bits(self) -> u32 {
        self.bits
    }

    pub fn width(self) -> SampleWidth {
        self.width
    }

    /// Largest positive code, `2^(bits-1) - 1`
    pub fn max_value(self) -> i32 {
        ((1i64 << (self.bits - 1)) - 1) as i32
    }

    /// Most negative code, `-2^(bits-1)`
    pub fn min_value(self) -> i32 {
        (-(1i64 << (self.bits - 1))) as i32
    }

    /// Scale factor applied to a unit source sample
    pub fn amplitude(self) -> f64 {
        f64::from(self.max_value()) * AMPLITUDE_HEADROOM
    }

    /// Convert an accumulated value to an integer code
    ///
    /// Truncates toward zero (no rounding), then clamps to the signed range of
    /// the resolution. NaN maps to zero.
    pub fn quantize(self, value: f64) -> i32 {
        if value.is_nan() {
            return 0;
        }
        let clamped = value
            .trunc()
            .clamp(f64::from(self.min_value()), f64::from(self.max_value()));
        clamped as i32
    }
}
