//! Tracing subscriber setup for the binary.

use crate::core::config::{LogFormat, Settings};
use crate::core::error::FaqError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// `RUST_LOG` wins over the configured level. Logs go to stderr so chat
/// replies on stdout stay clean.
pub fn init(settings: &Settings) -> Result<(), FaqError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .map_err(|e| FaqError::ConfigError(format!("invalid log_level: {e}")))?;

    let result = match settings.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| FaqError::ConfigError(format!("logging already initialized: {e}")))
}
