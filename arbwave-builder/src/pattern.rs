//! Pattern-mode load and replay commands
//!
//! A built waveform is stored in the board's pattern memory by a load
//! command and played back later by replay commands that refer to it. The
//! catalog remembers what was loaded so replays can be issued by index.

use crate::error::{BuildError, Result};
use crate::topology::ChannelTopology;
use crate::waveform::SampleWidth;
use arbwave_common::PatternSettings;
use serde::{Deserialize, Serialize};

/// Catalog label of a waveform loaded by this builder
pub const LOAD_LABEL: &str = "ArbWave";

/// Pattern memory footprint in 32-bit words
///
/// Sample bytes across all active outputs, rounded up to a whole word.
///
/// # Errors
/// `InvalidLayout` if the byte count does not fit in `usize`
pub fn pattern_size_words(
    events: usize,
    active_channels: usize,
    width: SampleWidth,
) -> Result<usize> {
    events
        .checked_mul(active_channels)
        .and_then(|samples| samples.checked_mul(width.bytes()))
        .map(|bytes| bytes.div_ceil(4))
        .ok_or_else(|| {
            BuildError::InvalidLayout(format!(
                "pattern of {} events x {} outputs overflows",
                events, active_channels
            ))
        })
}

/// Behaviour once a pattern has played through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Start again from the first sample
    PlayAgain,

    /// Hold the output flat
    Flatline,
}

impl RepeatMode {
    pub fn from_loop(loop_mode: bool) -> Self {
        if loop_mode {
            RepeatMode::PlayAgain
        } else {
            RepeatMode::Flatline
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    Load,
    Replay,
}

/// One loaded pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub label: String,
    pub address: u32,
    pub size_in_words: usize,
}

/// Pattern info sent to the board ahead of (or instead of) waveform data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCommand {
    pub pid: u32,
    pub stream_ids: Vec<u32>,
    pub tags: Vec<u8>,
    pub address: u32,
    pub size_in_words: usize,
    pub repeat_count: u32,
    pub kind: PatternKind,
    pub repeat_mode: RepeatMode,
}

/// Patterns currently resident in pattern memory
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    entries: Vec<PatternEntry>,
}

impl PatternCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    /// Record a freshly built waveform and return its load command
    ///
    /// Loading replaces everything previously held in the catalog.
    pub fn load(
        &mut self,
        topology: &ChannelTopology,
        settings: &PatternSettings,
        size_in_words: usize,
    ) -> PatternCommand {
        self.entries.clear();
        self.entries.push(PatternEntry {
            label: LOAD_LABEL.to_string(),
            address: settings.address,
            size_in_words,
        });

        PatternCommand {
            pid: 0,
            stream_ids: topology.device_stream_ids(),
            tags: topology.tags(),
            address: settings.address,
            size_in_words,
            repeat_count: settings.repeat_count,
            kind: PatternKind::Load,
            repeat_mode: RepeatMode::from_loop(settings.loop_mode),
        }
    }

    /// Replay command for a previously loaded pattern
    ///
    /// # Errors
    /// `PatternNotFound` if `index` is not in the catalog
    pub fn replay(
        &self,
        index: usize,
        topology: &ChannelTopology,
        settings: &PatternSettings,
    ) -> Result<PatternCommand> {
        let entry = self
            .entries
            .get(index)
            .ok_or(BuildError::PatternNotFound(index))?;

        Ok(PatternCommand {
            pid: 0,
            stream_ids: topology.device_stream_ids(),
            tags: topology.tags(),
            address: entry.address,
            size_in_words: entry.size_in_words,
            repeat_count: settings.repeat_count,
            kind: PatternKind::Replay,
            repeat_mode: RepeatMode::from_loop(settings.loop_mode),
        })
    }
}
