// Logging setup.
// Installs a tracing subscriber honoring RUST_LOG and the configured format.

use std::env;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

use crate::config::{LogFormat, Logging};

/// Filter used when `RUST_LOG` is unset: the configured level for this crate,
/// warnings for everything else.
fn default_filter(level: &str) -> String {
    format!("warn,catalog_cache={level}")
}

/// Initializes logging.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this twice is a no-op.
pub fn init_logging(config: &Logging) {
    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(&rust_log));

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Simplified => builder.compact().with_ansi(false).try_init(),
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}
