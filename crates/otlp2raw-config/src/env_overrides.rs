use anyhow::{anyhow, Context, Result};
use otlp2raw_core::InputFormat;

use crate::{LogFormat, RuntimeConfig};

pub const ENV_PREFIX: &str = "OTLP2RAW_";

/// Abstraction over environment-variable lookups so tests can supply their own
/// source of overrides.
pub trait EnvSource {
    /// Look up `key` under the `OTLP2RAW_` prefix.
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Normalizer
    if let Some(val) = get_env_usize(env, "MAX_ATTRIBUTE_DEPTH")? {
        config.normalizer.max_attribute_depth = val;
    }

    // Input
    if let Some(path) = get_env_string(env, "INPUT")? {
        config.input.path = Some(path);
    }
    if let Some(format) = get_env_string(env, "INPUT_FORMAT")? {
        let parsed = format
            .parse::<InputFormat>()
            .map_err(|e| anyhow!(e))
            .context("Invalid OTLP2RAW_INPUT_FORMAT value")?;
        config.input.format = Some(parsed);
    }

    // Output
    if let Some(path) = get_env_string(env, "OUTPUT")? {
        config.output.path = Some(path);
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL")? {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT")? {
        config.log.format = format
            .parse::<LogFormat>()
            .context("Invalid OTLP2RAW_LOG_FORMAT value")?;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get(key))
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .trim()
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
