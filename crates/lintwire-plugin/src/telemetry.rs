//! Logging setup for plugin processes.
//!
//! The host owns the plugin's stdout, so records always go to stderr.

use std::io::{self, IsTerminal};

use lintwire_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

static SUBSCRIBER_INSTALLED: OnceCell<()> = OnceCell::new();

/// Errors raised while installing the log subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Filter expression as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Installs the global subscriber described by `config`.
///
/// Only the first successful call installs anything. Later calls return
/// `Ok(())` without inspecting `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an invalid filter expression and
/// [`TelemetryError::Subscriber`] when a foreign subscriber is already set.
///
/// # Example
///
/// ```
/// use lintwire_config::Config;
/// use lintwire_plugin::telemetry;
///
/// let config = Config::default();
/// telemetry::initialise(&config).expect("first call installs");
/// telemetry::initialise(&config).expect("second call is a no-op");
/// ```
pub fn initialise(config: &Config) -> Result<(), TelemetryError> {
    SUBSCRIBER_INSTALLED
        .get_or_try_init(|| install(config))
        .map(|_| ())
}

fn install(config: &Config) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            message: error.to_string(),
        })?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
