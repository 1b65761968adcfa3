//! Waveform synthesis
//!
//! Turns a normalized floating-point source into quantized per-device
//! scratch buffers.

pub mod bit_depth;
pub mod descriptor;
pub mod scratch;
pub mod source;
pub mod synth;

pub use bit_depth::{BitDepth, SampleWidth};
pub use descriptor::WaveformDescriptor;
pub use scratch::ScratchBuffer;
pub use source::SampleSource;
pub use synth::WaveformSynthesizer;
