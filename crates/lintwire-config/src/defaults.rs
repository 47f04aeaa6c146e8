#[cfg(unix)]
use camino::Utf8PathBuf;
#[cfg(unix)]
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::runtime_dir;

use crate::socket::SocketEndpoint;

/// Default TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 9781;

/// Default log filter expression used by plugin processes.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// File name of the socket the host listens on.
pub const HOST_SOCKET_NAME: &str = "host.sock";

/// Default log filter expression used by plugin processes.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for plugin processes.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Computes the socket endpoint a plugin dials when none is configured.
pub fn default_socket_endpoint() -> SocketEndpoint {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("lintwire");
    if apply_namespace {
        base.push(user_namespace());
    }

    SocketEndpoint::unix(base.join(HOST_SOCKET_NAME))
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn default_endpoint_is_a_namespaced_unix_socket() {
        let endpoint = default_socket_endpoint();
        let path = endpoint.unix_path().expect("unix default on unix hosts");
        assert_eq!(path.file_name(), Some(HOST_SOCKET_NAME));
        assert!(
            path.components().any(|part| part.as_str() == "lintwire"),
            "expected lintwire directory in {path}"
        );
    }

    #[test]
    fn default_filter_matches_constant() {
        assert_eq!(default_log_filter(), default_log_filter_string());
    }
}
