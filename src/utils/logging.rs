//! Logging initialization
//!
//! - Respects the RUST_LOG environment variable, which always wins
//! - Falls back to the configured filter, then to "info"
//! - Human-readable output on stderr, JSON behind the `json-logging` feature
//!
//! # Usage
//! ```rust,no_run
//! use importmap_ingest::utils::init_logging;
//!
//! init_logging(None); // Uses RUST_LOG or defaults to "info"
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter to use given an optional configured filter
fn env_filter(filter: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(filter.unwrap_or("info"))
}

/// Initialize human-readable logging
///
/// # Arguments
/// * `filter` - Optional log filter from config (e.g. "info", "importmap_ingest::ingest=debug").
///   If None, uses RUST_LOG or defaults to "info"
pub fn init_logging(filter: Option<&str>) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(env_filter(filter))
        .init();
}

/// Initialize logging with JSON output (for log aggregation)
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter(filter))
        .init();
}

/// Initialize logging from BootstrapConfig
///
/// # Example
/// ```rust,no_run
/// use importmap_ingest::config::BootstrapConfig;
/// use importmap_ingest::utils::init_logging_from_config;
///
/// let config = BootstrapConfig::default();
/// init_logging_from_config(config.logging.as_ref());
/// ```
pub fn init_logging_from_config(config: Option<&LoggingConfig>) {
    let filter = config.and_then(|c| c.filter.as_deref());

    if config.map(|c| c.json_format).unwrap_or(false) {
        #[cfg(feature = "json-logging")]
        {
            init_json_logging(filter);
        }
        #[cfg(not(feature = "json-logging"))]
        {
            // Fall back to regular logging if json-logging feature not enabled
            init_logging(filter);
        }
    } else {
        init_logging(filter);
    }
}
