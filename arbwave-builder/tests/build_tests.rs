//! End-to-end tests for the waveform build pipeline
//!
//! Builds real outbound buffers and decodes them again to check sample
//! conservation, sequence numbering, quantization range and determinism.

mod helpers;

use arbwave_builder::waveform::BitDepth;
use arbwave_builder::{build, BuildError, SampleSource, WaveBuilder, WaveformDescriptor, WaveformSynthesizer};
use helpers::{decode, sine_for, stream_samples};

// ============================================================================
// Reference scenario
// ============================================================================

/// **Given:** two mono devices, 4 samples at 16 bits, chunks of 2
/// **When:** the waveform is built
/// **Then:** four packets alternate between devices with sequences 0,0,1,1
#[test]
fn test_two_device_reference_scenario() {
    let desc = WaveformDescriptor::new(1, 16, 4, vec![0x10, 0x11]);
    let source = SampleSource::new(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);

    let outbound = build(&desc, &source, 2).unwrap();
    let packets = decode(&outbound);

    let a = BitDepth::new(16).unwrap().quantize(BitDepth::new(16).unwrap().amplitude());
    assert_eq!(a, 31128);

    assert_eq!(packets.len(), 4);
    let sequences: Vec<u32> = packets.iter().map(|p| p.sequence()).collect();
    assert_eq!(sequences, vec![0, 0, 1, 1]);
    let streams: Vec<u32> = packets.iter().map(|p| p.stream_id()).collect();
    assert_eq!(streams, vec![0x10, 0x11, 0x10, 0x11]);

    assert_eq!(packets[0].samples, vec![a, 0]);
    assert_eq!(packets[1].samples, vec![0, 0]);
    assert_eq!(packets[2].samples, vec![a, 0]);
    assert_eq!(packets[3].samples, vec![0, 0]);

    assert_eq!(outbound.packet_count(), 4);
    assert_eq!(outbound.payload_words(), 8);
}

// ============================================================================
// Error scenarios
// ============================================================================

#[test]
fn test_zero_chunk_bound_is_chunk_overflow() {
    let desc = WaveformDescriptor::new(1, 16, 4, vec![0x10, 0x11]);
    let source = sine_for(&desc, 8);
    assert_eq!(build(&desc, &source, 0), Err(BuildError::ChunkOverflow(0)));
}

#[test]
fn test_short_source_is_invalid_layout() {
    let desc = WaveformDescriptor::new(2, 16, 16, vec![0x10, 0x11]);
    let required = desc.required_source_len().unwrap();
    let source = SampleSource::new(vec![0.5; required - 1]);

    let result = build(&desc, &source, 8);
    assert!(matches!(result, Err(BuildError::InvalidLayout(_))));
}

#[test]
fn test_empty_topology() {
    let source = SampleSource::new(vec![0.0; 16]);

    let no_devices = WaveformDescriptor::new(1, 16, 4, vec![]);
    assert!(matches!(
        build(&no_devices, &source, 4),
        Err(BuildError::EmptyTopology(_))
    ));

    let no_channels = WaveformDescriptor::new(0, 16, 4, vec![1]);
    assert!(matches!(
        build(&no_channels, &source, 4),
        Err(BuildError::EmptyTopology(_))
    ));
}

#[test]
fn test_unsupported_bit_depth() {
    let source = SampleSource::new(vec![0.0; 16]);
    for bits in [0, 33, 64] {
        let desc = WaveformDescriptor::new(1, bits, 4, vec![1, 2]);
        assert_eq!(
            build(&desc, &source, 4),
            Err(BuildError::UnsupportedBitDepth(bits))
        );
    }
}

#[test]
fn test_more_than_two_devices_rejected() {
    let desc = WaveformDescriptor::new(1, 16, 4, vec![1, 2, 3]);
    let source = SampleSource::new(vec![0.0; 64]);
    assert!(matches!(
        build(&desc, &source, 4),
        Err(BuildError::InvalidLayout(_))
    ));
}

#[test]
fn test_zero_sample_count_rejected() {
    let desc = WaveformDescriptor::new(1, 16, 0, vec![1, 2]);
    let source = SampleSource::new(Vec::new());
    assert!(matches!(
        build(&desc, &source, 4),
        Err(BuildError::InvalidLayout(_))
    ));
}

// ============================================================================
// Properties
// ============================================================================

/// Every device carries exactly `sample_count * channels_per_device` samples
/// and the decoded payloads reproduce the scratch buffers.
#[test]
fn test_samples_conserved_per_device() {
    let cases = [
        (1, 16, 100, vec![1u32, 2], 7),
        (2, 16, 33, vec![5, 9], 16),
        (2, 8, 64, vec![3], 64),
        (1, 24, 10, vec![0xA0, 0xB0], 1),
        (2, 12, 50, vec![7, 8], 1000),
    ];

    for (channels, bits, samples, sids, max_chunk) in cases {
        let desc = WaveformDescriptor::new(channels, bits, samples, sids.clone());
        let source = sine_for(&desc, 17);

        let scratch = WaveformSynthesizer::synthesize(&desc, &source).unwrap();
        let outbound = build(&desc, &source, max_chunk).unwrap();
        let packets = decode(&outbound);

        for (device, &sid) in sids.iter().enumerate() {
            assert_eq!(outbound.payload_words_for(sid), samples * channels);
            assert_eq!(
                stream_samples(&packets, sid),
                scratch[device].samples().to_vec(),
                "payload mismatch for stream {sid:#x} ({bits} bits, chunk {max_chunk})"
            );
        }
    }
}

/// Packets covering the same offset share a sequence number and carry
/// distinct stream ids from the descriptor.
#[test]
fn test_sequence_shared_per_offset() {
    let desc = WaveformDescriptor::new(2, 16, 40, vec![0x100, 0x200]);
    let source = sine_for(&desc, 13);
    let outbound = build(&desc, &source, 12).unwrap();

    let manifest = outbound.packets();
    for pair in manifest.chunks(2) {
        assert_eq!(pair[0].sequence, pair[1].sequence);
        assert_eq!(pair[0].offset, pair[1].offset);
        assert_ne!(pair[0].stream_id, pair[1].stream_id);
        assert!(desc.device_stream_ids.contains(&pair[0].stream_id));
        assert!(desc.device_stream_ids.contains(&pair[1].stream_id));
    }

    // Decoded headers agree with the manifest
    let packets = decode(&outbound);
    for (summary, packet) in manifest.iter().zip(&packets) {
        assert_eq!(summary.sequence, packet.sequence());
        assert_eq!(summary.stream_id, packet.stream_id());
        assert_eq!(summary.len, packet.samples.len());
    }
}

#[test]
fn test_quantization_range_16_bit() {
    let desc = WaveformDescriptor::new(1, 16, 8, vec![1, 2]);
    let source = SampleSource::new(vec![
        3.0, -3.0, 1.0, -1.0, 0.999, -0.999, 1.5, -1.5, 100.0, -100.0, 0.0, 0.0, 1.1, -1.1,
        0.5, -0.5,
    ]);

    let packets = decode(&build(&desc, &source, 4).unwrap());
    for packet in &packets {
        for &sample in &packet.samples {
            assert!((-32768..=32767).contains(&sample), "{sample} out of range");
        }
    }
    assert_eq!(stream_samples(&packets, 1)[0], 32767);
    assert_eq!(stream_samples(&packets, 2)[0], -32768);
}

#[test]
fn test_quantization_range_8_bit() {
    let desc = WaveformDescriptor::new(1, 8, 4, vec![1, 2]);
    let source = SampleSource::new(vec![2.0, -2.0, 1.0, -1.0, 0.5, -0.5, 0.0, 0.0]);

    let packets = decode(&build(&desc, &source, 4).unwrap());
    for packet in &packets {
        assert_eq!(packet.header.sample_width, 1);
        for &sample in &packet.samples {
            assert!((-128..=127).contains(&sample), "{sample} out of range");
        }
    }
    assert_eq!(stream_samples(&packets, 1), vec![127, 120, 60, 0]);
    assert_eq!(stream_samples(&packets, 2), vec![-128, -120, -60, 0]);
}

#[test]
fn test_build_is_deterministic() {
    let desc = WaveformDescriptor::new(2, 16, 500, vec![0x10, 0x11]);
    let source = sine_for(&desc, 37);

    let first = build(&desc, &source, 64).unwrap();
    let second = build(&desc, &source, 64).unwrap();

    assert_eq!(first.as_bytes(), second.as_bytes());
    assert_eq!(first.packets(), second.packets());
}

// ============================================================================
// Chunk boundaries
// ============================================================================

#[test]
fn test_exact_multiple_has_no_short_chunk() {
    // 2 channels x 12 samples = 24 words per device, chunks of 8
    let desc = WaveformDescriptor::new(2, 16, 12, vec![1, 2]);
    let source = sine_for(&desc, 5);
    let outbound = build(&desc, &source, 8).unwrap();

    assert_eq!(outbound.packet_count(), 6);
    assert!(outbound.packets().iter().all(|p| p.len == 8));
    assert_eq!(outbound.report().chunks, 3);
}

#[test]
fn test_one_short_of_multiple_has_one_short_chunk() {
    // 1 channel x 23 samples = 23 words per device, chunks of 8
    let desc = WaveformDescriptor::new(1, 16, 23, vec![1, 2]);
    let source = sine_for(&desc, 5);
    let outbound = build(&desc, &source, 8).unwrap();

    let lens: Vec<usize> = outbound.packets().iter().map(|p| p.len).collect();
    assert_eq!(lens, vec![8, 8, 8, 8, 7, 7]);
}

#[test]
fn test_chunk_larger_than_buffer() {
    let desc = WaveformDescriptor::new(1, 16, 10, vec![1, 2]);
    let source = sine_for(&desc, 5);
    let outbound = build(&desc, &source, 0x100000).unwrap();

    assert_eq!(outbound.packet_count(), 2);
    assert!(outbound.packets().iter().all(|p| p.sequence == 0 && p.len == 10));
}

// ============================================================================
// Container and packer framing
// ============================================================================

#[test]
fn test_container_header_describes_buffer() {
    let desc = WaveformDescriptor::new(2, 16, 9, vec![1, 2]);
    let source = sine_for(&desc, 7);
    let outbound = build(&desc, &source, 4).unwrap();
    let bytes = outbound.as_bytes();

    assert_eq!(&bytes[0..4], b"VELO");
    let size_words = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let packet_count = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    assert_eq!(size_words as usize * 4, bytes.len());
    assert_eq!(packet_count as usize, outbound.packet_count());
    assert_eq!(bytes.len() % 4, 0);
}

#[test]
fn test_frame_capacity_does_not_change_output() {
    let desc = WaveformDescriptor::new(2, 16, 200, vec![1, 2]);
    let source = sine_for(&desc, 31);

    let unbounded = WaveBuilder::new(16).build(&desc, &source).unwrap();
    for capacity in [1, 10, 64, 4096] {
        let bounded = WaveBuilder::new(16)
            .with_frame_capacity(capacity)
            .build(&desc, &source)
            .unwrap();
        assert_eq!(unbounded.as_bytes(), bounded.as_bytes());
    }
}

#[test]
fn test_odd_byte_payload_is_padded() {
    let desc = WaveformDescriptor::new(1, 8, 5, vec![1, 2]);
    let source = sine_for(&desc, 4);
    let outbound = build(&desc, &source, 3).unwrap();

    let packets = decode(&outbound);
    assert_eq!(packets.len(), 4);
    // 3 bytes pad to 1 word, 2 bytes pad to 1 word: 7 words each
    assert!(packets.iter().all(|p| p.header.size_words == 7));
}
