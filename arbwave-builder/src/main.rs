//! Waveform builder (arbwave-builder) - Main entry point
//!
//! Reads a normalized waveform file, builds the framed packet stream for the
//! configured channel topology, and writes it out for transmission. Also
//! decodes existing outbound buffers for inspection.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arbwave_builder::inspect::parse_outbound;
use arbwave_builder::pattern::{pattern_size_words, PatternCatalog};
use arbwave_builder::waveform::BitDepth;
use arbwave_builder::{ChannelTopology, SampleSource, WaveBuilder};
use arbwave_common::config::{BuilderSettings, TomlConfig};
use arbwave_common::logging::init_tracing;
use arbwave_common::ConfigResolver;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

/// Command-line arguments for arbwave-builder
#[derive(Parser, Debug)]
#[command(name = "arbwave-builder")]
#[command(about = "Build framed waveform packet streams for arbitrary waveform generators")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ", ", env!("BUILD_PROFILE"), ")"))]
struct Cli {
    /// Configuration file (defaults to ARBWAVE_CONFIG, then the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an outbound buffer from a waveform file
    Build(BuildArgs),

    /// Decode an outbound buffer and list its packets
    Inspect {
        /// Outbound buffer file
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Waveform file: JSON array of numbers, or whitespace/comma separated text
    #[arg(short, long)]
    input: PathBuf,

    /// Destination for the outbound buffer
    #[arg(short, long)]
    output: PathBuf,

    /// DAC resolution in bits
    #[arg(long)]
    bits: Option<u32>,

    /// Maximum payload samples per packet
    #[arg(long)]
    max_chunk_words: Option<usize>,

    /// Stream ids of device 0 and device 1
    #[arg(long, value_delimiter = ',')]
    stream_ids: Option<Vec<u32>>,

    /// Enabled output channels (0-3)
    #[arg(long, value_delimiter = ',')]
    enable: Option<Vec<usize>>,

    /// Trigger frame granularity the source is padded to
    #[arg(long)]
    granularity: Option<usize>,

    /// Packer frame capacity in 32-bit words (0 = unbounded)
    #[arg(long)]
    frame_capacity_words: Option<usize>,

    /// Also print the pattern load command
    #[arg(long)]
    pattern: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = ConfigResolver::new(cli.config.clone())
        .load()
        .context("Failed to load configuration")?;
    init_tracing(&loaded.config.logging).context("Failed to initialize logging")?;
    loaded.log_source();
    let config = loaded.config;

    info!(
        "arbwave-builder {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    match cli.command {
        Command::Build(args) => run_build(&config, args),
        Command::Inspect { file } => run_inspect(&file),
    }
}

fn run_build(config: &TomlConfig, args: BuildArgs) -> Result<()> {
    let settings = apply_overrides(config.builder.clone(), &args)?;
    settings
        .validate()
        .context("Invalid builder settings")?;

    let mut source = read_source(&args.input)?;
    let padded = source.pad_to_granularity(settings.trigger_frame_granularity);
    info!(
        "Loaded {} samples from {} ({} padding)",
        source.len(),
        args.input.display(),
        padded
    );

    let topology = ChannelTopology::from_settings(&settings);
    let descriptor = topology.descriptor(settings.bit_depth, &source)?;
    debug!("Descriptor: {:?}", descriptor);

    let outbound = WaveBuilder::from_settings(&settings).build(&descriptor, &source)?;

    let report = outbound.report();
    std::fs::write(&args.output, outbound.into_bytes())
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Wrote {} bytes to {}", report.bytes, args.output.display());

    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.pattern {
        let width = BitDepth::new(settings.bit_depth)?.width();
        let size_in_words =
            pattern_size_words(descriptor.sample_count, topology.active_channels(), width)?;
        let mut catalog = PatternCatalog::new();
        let command = catalog.load(&topology, &config.pattern, size_in_words);
        println!("{}", serde_json::to_string_pretty(&command)?);
    }

    Ok(())
}

fn run_inspect(file: &Path) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let packets = parse_outbound(&bytes)?;

    println!("{} packets, {} bytes", packets.len(), bytes.len());
    for packet in &packets {
        println!(
            "stream {:#010x}  seq {:>6}  width {}  samples {:>8}",
            packet.stream_id(),
            packet.sequence(),
            packet.header.sample_width,
            packet.samples.len()
        );
    }
    Ok(())
}

/// Command-line values take priority over the configuration file
fn apply_overrides(mut settings: BuilderSettings, args: &BuildArgs) -> Result<BuilderSettings> {
    if let Some(bits) = args.bits {
        settings.bit_depth = bits;
    }
    if let Some(words) = args.max_chunk_words {
        settings.max_chunk_words = words;
    }
    if let Some(granularity) = args.granularity {
        settings.trigger_frame_granularity = granularity;
    }
    if let Some(words) = args.frame_capacity_words {
        settings.frame_capacity_words = words;
    }
    if let Some(ids) = &args.stream_ids {
        settings.stream_ids = match ids.as_slice() {
            &[first, second] => [first, second],
            _ => bail!("--stream-ids takes exactly two values, got {}", ids.len()),
        };
    }
    if let Some(channels) = &args.enable {
        let mut enabled = [false; 4];
        for &channel in channels {
            if channel >= enabled.len() {
                bail!("--enable channel {} out of range 0-3", channel);
            }
            enabled[channel] = true;
        }
        settings.enabled_channels = enabled;
    }
    Ok(settings)
}

/// Parse a waveform file into samples
fn read_source(path: &Path) -> Result<SampleSource> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if text.trim_start().starts_with('[') {
        let samples: Vec<f64> = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON waveform in {}", path.display()))?;
        return Ok(SampleSource::new(samples));
    }

    let samples = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("Invalid sample '{}' in {}", token, path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SampleSource::new(samples))
}
