//! Error types for arbwave-builder
//!
//! Every failure is detected synchronously inside one build call. Nothing is
//! retried and a failed build returns no partial buffer.

use thiserror::Error;

/// Main error type for the waveform build pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Source array too short or inconsistent with the descriptor
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Bit depth is zero or wider than the 32-bit sample container
    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u32),

    /// Chunk bound is not positive
    #[error("Chunk overflow: max chunk words must be positive, got {0}")]
    ChunkOverflow(usize),

    /// Header or trailer could not describe the packet
    #[error("Framing error: {0}")]
    FramingError(String),

    /// Zero devices or zero channels requested
    #[error("Empty topology: {0}")]
    EmptyTopology(String),

    /// Replay requested for a pattern that was never loaded
    #[error("Pattern not found: index {0}")]
    PatternNotFound(usize),
}

/// Convenience Result type using BuildError
pub type Result<T> = std::result::Result<T, BuildError>;
