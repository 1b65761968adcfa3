//! # Arbwave Common Library
//!
//! Shared code for the arbwave workspace:
//! - Error types
//! - TOML configuration loading and resolution
//! - Tracing initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    BuilderSettings, ConfigResolver, ConfigSource, LoadedConfig, LoggingConfig, PatternSettings,
    TomlConfig,
};
pub use error::{Error, Result};
