//! Shared configuration for lintwire plugin processes.
//!
//! A plugin is launched by the host and dials back to it over a Unix domain
//! socket or TCP. The endpoint and the logging setup are resolved from, in
//! increasing order of precedence: built-in defaults, a TOML configuration
//! file, `LINTWIRE_*` environment variables, and command-line flags.

mod defaults;
mod logging;
mod socket;

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, HOST_SOCKET_NAME, default_log_filter,
    default_log_filter_string, default_log_format, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError};

/// Resolved plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "LINTWIRE")]
pub struct Config {
    /// Endpoint of the host process the plugin reports to.
    #[serde(default = "default_socket_endpoint")]
    #[ortho_config(default = default_socket_endpoint())]
    pub host_socket: SocketEndpoint,
    /// Tracing filter expression, in `EnvFilter` syntax.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records written to stderr.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Endpoint of the host process.
    #[must_use]
    pub const fn host_socket(&self) -> &SocketEndpoint {
        &self.host_socket
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer fails to parse.
    pub fn load_from_env() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter(std::env::args_os().collect::<Vec<OsString>>())
    }
}
