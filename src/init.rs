// Logging/tracing setup
//
// Logs always go to stderr; stdout is reserved for the record stream.

use otlp2raw_config::{LogConfig, LogFormat};

/// Initialize tracing/logging from the log section of the config
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_writer(std::io::stderr);

    // Ignore error if a subscriber is already set (idempotent)
    let _ = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(registry.with(layer.json())),
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(layer)),
    };
}
