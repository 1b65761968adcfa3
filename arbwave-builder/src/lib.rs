//! # Arbwave Waveform Builder Library (arbwave-builder)
//!
//! Turns a normalized floating-point waveform into the framed packet stream
//! an arbitrary waveform generator board consumes.
//!
//! **Pipeline:** source samples → per-device quantized scratch buffers →
//! bounded data packets (round-robin over devices) → one outbound container.
//!
//! ```ignore
//! let desc = WaveformDescriptor::new(1, 16, 4, vec![0x10, 0x11]);
//! let source = SampleSource::new(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
//! let outbound = arbwave_builder::build(&desc, &source, 2)?;
//! assert_eq!(outbound.packet_count(), 4);
//! ```

pub mod assembler;
pub mod builder;
pub mod chunker;
pub mod error;
pub mod framing;
pub mod inspect;
pub mod pattern;
pub mod topology;
pub mod waveform;

pub use assembler::{BuildReport, OutboundBuffer, OutputAssembler, PacketSummary};
pub use builder::{build, WaveBuilder};
pub use chunker::PacketChunker;
pub use error::{BuildError, Result};
pub use topology::ChannelTopology;
pub use waveform::{SampleSource, WaveformDescriptor, WaveformSynthesizer};
