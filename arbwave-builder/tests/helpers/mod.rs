//! Test helpers for arbwave-builder integration tests
//!
//! Deterministic waveform generation and decode shortcuts.

#![allow(dead_code)]

use arbwave_builder::inspect::{parse_outbound, DecodedPacket};
use arbwave_builder::{OutboundBuffer, SampleSource, WaveformDescriptor};
use std::f64::consts::PI;

/// Source of `len` samples following one sine period every `period` samples
pub fn sine_source(len: usize, period: usize) -> SampleSource {
    let samples = (0..len)
        .map(|i| (2.0 * PI * i as f64 / period as f64).sin())
        .collect();
    SampleSource::new(samples)
}

/// Source holding exactly what `descriptor` requires
pub fn sine_for(descriptor: &WaveformDescriptor, period: usize) -> SampleSource {
    sine_source(descriptor.required_source_len().unwrap(), period)
}

/// Decode an outbound buffer, panicking on framing errors
pub fn decode(outbound: &OutboundBuffer) -> Vec<DecodedPacket> {
    parse_outbound(outbound.as_bytes()).expect("outbound buffer should decode")
}

/// Concatenate the decoded payloads of one stream, in emission order
pub fn stream_samples(packets: &[DecodedPacket], stream_id: u32) -> Vec<i32> {
    packets
        .iter()
        .filter(|p| p.stream_id() == stream_id)
        .flat_map(|p| p.samples.iter().copied())
        .collect()
}
