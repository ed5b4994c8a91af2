use anyhow::{Context, Result};
use clap::Parser;
use otlp2raw_config::RuntimeConfig;
use otlp2raw_core::InputFormat;
use std::path::PathBuf;

/// Flatten OTLP trace export requests into one JSON span record per line
#[derive(Parser)]
#[command(name = "otlp2raw")]
#[command(version)]
#[command(about = "Flatten OTLP trace export requests into one JSON span record per line", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Payload to read; `-` or absent reads stdin
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Payload encoding: protobuf, json, jsonl (default: from file extension)
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<String>,

    /// JSONL destination; `-` or absent writes stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load_or_default().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli)?;
    config.validate()?;

    // Step 3: Logging, then the actual run
    otlp2raw::init::init_tracing(&config.log);
    otlp2raw::run(&config)?;

    Ok(())
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) -> Result<()> {
    if let Some(input) = &cli.input {
        config.input.path = Some(input.to_string_lossy().to_string());
    }

    if let Some(format) = &cli.format {
        let parsed = format
            .parse::<InputFormat>()
            .map_err(anyhow::Error::msg)
            .context("Invalid --format value")?;
        config.input.format = Some(parsed);
    }

    if let Some(output) = &cli.output {
        config.output.path = Some(output.to_string_lossy().to_string());
    }

    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }

    Ok(())
}
