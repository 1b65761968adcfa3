//! Configuration loading and resolution
//!
//! Configuration is a single TOML file with two tables, `[builder]` and
//! `[logging]`. Every field has a compiled default, so an empty file (or no
//! file at all) is a valid configuration.
//!
//! # Sources Priority
//!
//! 1. Explicit path (command-line `--config`)
//! 2. Environment variable (`ARBWAVE_CONFIG`)
//! 3. Platform config file (`~/.config/arbwave/config.toml` on Linux)
//! 4. Compiled defaults
//!
//! A missing file never aborts startup: a warning is logged and defaults are
//! used. A file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "ARBWAVE_CONFIG";

/// Largest payload, in samples, carried by one data packet
pub const DEFAULT_MAX_CHUNK_WORDS: usize = 0x10_0000;

/// Complete configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Waveform build settings
    #[serde(default)]
    pub builder: BuilderSettings,

    /// Pattern-mode load/replay settings
    #[serde(default)]
    pub pattern: PatternSettings,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings consumed by the waveform build pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderSettings {
    /// Maximum payload samples per data packet
    #[serde(default = "default_max_chunk_words")]
    pub max_chunk_words: usize,

    /// DAC resolution in bits
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u32,

    /// Source length is padded with zeros to a multiple of this value
    #[serde(default = "default_trigger_frame_granularity")]
    pub trigger_frame_granularity: usize,

    /// Capacity of one packer output frame in 32-bit words (0 = unbounded)
    #[serde(default)]
    pub frame_capacity_words: usize,

    /// Stream id of each device, in device order
    #[serde(default = "default_stream_ids")]
    pub stream_ids: [u32; 2],

    /// Enabled state of each output channel
    #[serde(default = "default_enabled_channels")]
    pub enabled_channels: [bool; 4],
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            max_chunk_words: default_max_chunk_words(),
            bit_depth: default_bit_depth(),
            trigger_frame_granularity: default_trigger_frame_granularity(),
            frame_capacity_words: 0,
            stream_ids: default_stream_ids(),
            enabled_channels: default_enabled_channels(),
        }
    }
}

impl BuilderSettings {
    /// Reject settings that can never produce a valid build
    ///
    /// Chunk size and bit depth are checked again by the builder itself; this
    /// only catches what the builder cannot see, such as two devices sharing
    /// one stream id.
    pub fn validate(&self) -> Result<()> {
        let unique: HashSet<u32> = self.stream_ids.iter().copied().collect();
        if unique.len() != self.stream_ids.len() {
            return Err(Error::Config(format!(
                "stream ids must be unique, got {:?}",
                self.stream_ids
            )));
        }
        if self.trigger_frame_granularity == 0 {
            return Err(Error::Config(
                "trigger_frame_granularity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pattern-mode settings sent alongside a loaded waveform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSettings {
    /// Pattern memory address the waveform is loaded at
    #[serde(default)]
    pub address: u32,

    /// Number of times the pattern is played per trigger
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,

    /// Replay from the start when the pattern ends (otherwise hold flat)
    #[serde(default)]
    pub loop_mode: bool,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            address: 0,
            repeat_count: default_repeat_count(),
            loop_mode: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_max_chunk_words() -> usize {
    DEFAULT_MAX_CHUNK_WORDS
}

fn default_bit_depth() -> u32 {
    16
}

fn default_trigger_frame_granularity() -> usize {
    1
}

fn default_stream_ids() -> [u32; 2] {
    [0, 1]
}

fn default_enabled_channels() -> [bool; 4] {
    [true; 4]
}

fn default_repeat_count() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Load and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)?;
        config.builder.validate()?;
        Ok(config)
    }
}

/// Locates the configuration file and loads it with graceful fallback
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    explicit: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver, optionally with a path given on the command line
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self { explicit }
    }

    /// Resolve the configuration file path following the priority order
    ///
    /// Returns `None` when no source names a file and the platform default
    /// does not exist.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.explicit {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config file
        default_config_path().filter(|p| p.exists())
    }

    /// Load the configuration, falling back to compiled defaults
    ///
    /// Nothing is logged here; configuration is usually read before the
    /// tracing subscriber exists. Call [`LoadedConfig::log_source`] once
    /// logging is up.
    ///
    /// # Errors
    ///
    /// Returns error if the resolved file exists but cannot be parsed or
    /// holds invalid settings.
    pub fn load(&self) -> Result<LoadedConfig> {
        match self.resolve_path() {
            Some(path) if path.exists() => Ok(LoadedConfig {
                config: TomlConfig::load(&path)?,
                source: ConfigSource::File(path),
            }),
            Some(path) => Ok(LoadedConfig {
                config: TomlConfig::default(),
                source: ConfigSource::Missing(path),
            }),
            None => Ok(LoadedConfig {
                config: TomlConfig::default(),
                source: ConfigSource::Defaults,
            }),
        }
    }
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),

    /// This file was named but does not exist; defaults were used
    Missing(PathBuf),

    /// No file was named and none exists at the platform path
    Defaults,
}

/// Resolved configuration together with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

impl LoadedConfig {
    /// Report the configuration origin; a named but missing file is a warning
    pub fn log_source(&self) {
        match &self.source {
            ConfigSource::File(path) => {
                info!("Loaded configuration from {}", path.display());
            }
            ConfigSource::Missing(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
            }
            ConfigSource::Defaults => {
                info!("No config file found, using compiled defaults");
            }
        }
    }
}

/// Platform configuration file path (`<config dir>/arbwave/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("arbwave").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builder_settings() {
        let settings = BuilderSettings::default();
        assert_eq!(settings.max_chunk_words, 0x100000);
        assert_eq!(settings.bit_depth, 16);
        assert_eq!(settings.trigger_frame_granularity, 1);
        assert_eq!(settings.frame_capacity_words, 0);
        assert_eq!(settings.stream_ids, [0, 1]);
        assert_eq!(settings.enabled_channels, [true; 4]);
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_partial_builder_table() {
        let config: TomlConfig = toml::from_str(
            r#"
            [builder]
            bit_depth = 8
            stream_ids = [16, 17]
            "#,
        )
        .unwrap();

        assert_eq!(config.builder.bit_depth, 8);
        assert_eq!(config.builder.stream_ids, [16, 17]);
        assert_eq!(config.builder.max_chunk_words, DEFAULT_MAX_CHUNK_WORDS);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.pattern.repeat_count, 1);
    }

    #[test]
    fn test_duplicate_stream_ids_rejected() {
        let settings = BuilderSettings {
            stream_ids: [5, 5],
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_granularity_rejected() {
        let settings = BuilderSettings {
            trigger_frame_granularity: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_reported() {
        let path = PathBuf::from("/nonexistent/arbwave/missing.toml");
        let loaded = ConfigResolver::new(Some(path.clone())).load().unwrap();
        assert_eq!(loaded.source, ConfigSource::Missing(path));
        assert_eq!(loaded.config, TomlConfig::default());
    }

    #[test]
    fn test_explicit_path_wins() {
        let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/arbwave-explicit.toml")));
        assert_eq!(
            resolver.resolve_path(),
            Some(PathBuf::from("/tmp/arbwave-explicit.toml"))
        );
    }
}
