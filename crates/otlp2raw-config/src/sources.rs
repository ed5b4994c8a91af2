// Configuration source loading.
//
// Priority order:
// 1. Environment variables (OTLP2RAW_* prefix)
// 2. Config file path from OTLP2RAW_CONFIG
// 3. Inline config content from OTLP2RAW_CONFIG_CONTENT
// 4. Default config files (./config.toml, ./.otlp2raw.toml)
// 5. Built-in defaults

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;

const DEFAULT_CONFIG_PATHS: &[&str] = &["./config.toml", "./.otlp2raw.toml"];

/// Reads overrides from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

pub fn load_config<E: EnvSource>(env: &E) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    if let Some(file_config) = load_from_file(env)? {
        config.merge(file_config);
    }

    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file<E: EnvSource>(env: &E) -> Result<Option<RuntimeConfig>> {
    if let Some(path) = env.get("CONFIG") {
        return read_config_file(&path).map(Some);
    }

    if let Some(content) = env.get("CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("Failed to parse inline config from OTLP2RAW_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in DEFAULT_CONFIG_PATHS {
        if Path::new(path).exists() {
            return read_config_file(path).map(Some);
        }
    }

    Ok(None)
}

fn read_config_file(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if the file doesn't exist or can't be parsed.
pub fn load_from_file_path<E: EnvSource>(path: impl AsRef<Path>, env: &E) -> Result<RuntimeConfig> {
    let file_config = read_config_file(path)?;

    let mut config = RuntimeConfig::default();
    config.merge(file_config);

    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration with graceful fallback to defaults when the config file is
/// missing or broken. Environment overrides and validation still apply.
pub fn load_or_default<E: EnvSource>(env: &E) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    match load_from_file(env) {
        Ok(Some(file_config)) => config.merge(file_config),
        Ok(None) => {}
        Err(e) => warn!(error = %format!("{e:#}"), "ignoring unreadable config file"),
    }

    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}
