// Configuration validation
//
// Validates that values are present and sensible

use anyhow::{bail, Result};
use tracing::warn;

use crate::*;

/// Hard ceiling for attribute nesting; deeper values would risk the recursion stack.
pub const MAX_ATTRIBUTE_DEPTH_LIMIT: usize = 64;

const DEEP_ATTRIBUTE_WARNING: usize = 32;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_normalizer_config(&config.normalizer)?;
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    validate_log_config(&config.log)?;
    Ok(())
}

fn validate_normalizer_config(config: &NormalizerConfig) -> Result<()> {
    if config.max_attribute_depth == 0 {
        bail!("normalizer.max_attribute_depth must be greater than 0");
    }

    if config.max_attribute_depth > MAX_ATTRIBUTE_DEPTH_LIMIT {
        bail!(
            "normalizer.max_attribute_depth must be at most {}",
            MAX_ATTRIBUTE_DEPTH_LIMIT
        );
    }

    if config.max_attribute_depth > DEEP_ATTRIBUTE_WARNING {
        warn!(
            max_attribute_depth = config.max_attribute_depth,
            "normalizer.max_attribute_depth is very deep; nested attributes may be slow to flatten"
        );
    }

    Ok(())
}

fn validate_input_config(config: &InputConfig) -> Result<()> {
    if matches!(config.path.as_deref(), Some(path) if path.trim().is_empty()) {
        bail!("input.path must not be empty");
    }
    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<()> {
    if matches!(config.path.as_deref(), Some(path) if path.trim().is_empty()) {
        bail!("output.path must not be empty");
    }
    Ok(())
}

fn validate_log_config(config: &LogConfig) -> Result<()> {
    if config.level.trim().is_empty() {
        bail!("log.level must not be empty");
    }
    Ok(())
}
