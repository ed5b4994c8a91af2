// otlp2raw-config - Runtime configuration for the otlp2raw binary
//
// Supports configuration from multiple sources:
// 1. CLI flags (applied by the binary, highest priority)
// 2. Environment variables (OTLP2RAW_* prefix)
// 3. Config file path from OTLP2RAW_CONFIG env var
// 4. Config file contents from OTLP2RAW_CONFIG_CONTENT env var
// 5. Default config file locations (./config.toml, ./.otlp2raw.toml)
// 6. Built-in defaults (lowest priority)

use std::path::Path;

use anyhow::Result;
use otlp2raw_core::attributes::DEFAULT_MAX_ATTRIBUTE_DEPTH;
use otlp2raw_core::{InputFormat, NormalizerOptions};
use serde::{Deserialize, Serialize};

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};
pub use sources::StdEnvSource;

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Normalizer tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default = "default_max_attribute_depth")]
    pub max_attribute_depth: usize,
}

fn default_max_attribute_depth() -> usize {
    DEFAULT_MAX_ATTRIBUTE_DEPTH
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_attribute_depth: default_max_attribute_depth(),
        }
    }
}

impl NormalizerConfig {
    pub fn options(&self) -> NormalizerOptions {
        NormalizerOptions {
            max_attribute_depth: self.max_attribute_depth,
        }
    }
}

/// Where payloads come from. A missing path or `-` means stdin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Explicit payload encoding; inferred from the file extension when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<InputFormat>,
}

impl InputConfig {
    pub fn reads_stdin(&self) -> bool {
        matches!(self.path.as_deref(), None | Some("-"))
    }

    /// Resolve the payload encoding: explicit setting, then file extension, then protobuf.
    pub fn resolved_format(&self) -> InputFormat {
        if let Some(format) = self.format {
            return format;
        }
        self.path
            .as_deref()
            .filter(|_| !self.reads_stdin())
            .and_then(|path| Path::new(path).extension())
            .and_then(|ext| ext.to_str())
            .and_then(InputFormat::from_extension)
            .unwrap_or_default()
    }
}

/// Where records go. A missing path or `-` means stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl OutputConfig {
    pub fn writes_stdout(&self) -> bool {
        matches!(self.path.as_deref(), None | Some("-"))
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority.
    ///
    /// Fails if a config file is named or found but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        sources::load_config(&StdEnvSource)
    }

    /// Load configuration from an explicit file path (for the CLI `--config` flag),
    /// then apply environment overrides.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path, &StdEnvSource)
    }

    /// Like [`RuntimeConfig::load`], but a broken config file falls back to defaults.
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default(&StdEnvSource)
    }

    /// Load configuration with a caller-supplied environment.
    pub fn load_with_env<E: EnvSource>(env: &E) -> Result<Self> {
        sources::load_config(env)
    }

    /// Overlay values from a parsed config file onto this configuration.
    pub fn merge(&mut self, other: RuntimeConfig) {
        self.normalizer = other.normalizer;
        self.log = other.log;

        if other.input.path.is_some() {
            self.input.path = other.input.path;
        }
        if other.input.format.is_some() {
            self.input.format = other.input.format;
        }
        if other.output.path.is_some() {
            self.output.path = other.output.path;
        }
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.normalizer.max_attribute_depth, DEFAULT_MAX_ATTRIBUTE_DEPTH);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Text);
        assert!(config.input.reads_stdin());
        assert!(config.output.writes_stdout());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [input]
            format = "jsonl"

            [log]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.input.format, Some(InputFormat::Jsonl));
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.normalizer.max_attribute_depth, DEFAULT_MAX_ATTRIBUTE_DEPTH);
    }

    #[test]
    fn test_resolved_format() {
        let mut input = InputConfig {
            path: Some("traces/batch.ndjson".to_string()),
            format: None,
        };
        assert_eq!(input.resolved_format(), InputFormat::Jsonl);

        input.path = Some("batch.json".to_string());
        assert_eq!(input.resolved_format(), InputFormat::Json);

        input.path = Some("batch.unknown".to_string());
        assert_eq!(input.resolved_format(), InputFormat::Protobuf);

        input.path = Some("-".to_string());
        assert_eq!(input.resolved_format(), InputFormat::Protobuf);

        input.path = Some("batch.json".to_string());
        input.format = Some(InputFormat::Protobuf);
        assert_eq!(input.resolved_format(), InputFormat::Protobuf);
    }

    #[test]
    fn test_merge_keeps_unset_paths() {
        let mut config = RuntimeConfig::default();
        config.output.path = Some("out.jsonl".to_string());

        let file_config: RuntimeConfig = toml::from_str(
            r#"
            [normalizer]
            max_attribute_depth = 8
            "#,
        )
        .unwrap();
        config.merge(file_config);

        assert_eq!(config.normalizer.max_attribute_depth, 8);
        assert_eq!(config.output.path.as_deref(), Some("out.jsonl"));
        assert_eq!(config.normalizer.options().max_attribute_depth, 8);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
