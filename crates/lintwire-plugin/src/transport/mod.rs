//! Typed calls over a connection to the host.
//!
//! A [`Connection`] moves raw JSON payloads. The [`CallGate`] owns one,
//! serialises access to it, and binds each call to a [`Procedure`] so that
//! request and response types are checked at compile time.

mod jsonrpc;
mod stream;

use std::sync::Mutex;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use self::jsonrpc::ErrorData;
pub use self::stream::{HostStream, StreamTransport};
use crate::error::{ClassifiedError, ClientError, TransportError};
use crate::protocol::Procedure;

/// Tracing target for transport operations.
pub(crate) const TRANSPORT_TARGET: &str = "lintwire_plugin::transport";

/// A bidirectional channel to the host.
///
/// Implementations make exactly one attempt per call and apply no timeout.
pub trait Connection {
    /// Sends `params` to the named procedure and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the exchange fails or the host
    /// reports a fault.
    fn round_trip(&mut self, method: &str, params: Value) -> Result<Value, TransportError>;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn round_trip(&mut self, method: &str, params: Value) -> Result<Value, TransportError> {
        (**self).round_trip(method, params)
    }
}

/// Serialises typed calls onto a shared connection.
///
/// The lock is held for a single round trip only, so code running between
/// calls, such as an attribute handler, may issue further calls.
pub struct CallGate<C> {
    connection: Mutex<C>,
}

impl<C: Connection> CallGate<C> {
    /// Wraps a connection.
    #[must_use]
    pub const fn new(connection: C) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    /// Consumes the gate, returning the connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionPoisoned`] if a caller panicked
    /// while holding the connection.
    pub fn into_inner(self) -> Result<C, TransportError> {
        self.connection
            .into_inner()
            .map_err(|_| TransportError::ConnectionPoisoned)
    }

    /// Invokes procedure `P` with `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] on connection, encoding, or
    /// decoding failures. A host fault carrying a code and severity is
    /// returned as [`ClientError::Classified`].
    pub fn call<P: Procedure>(&self, request: &P::Request) -> Result<P::Response, ClientError> {
        let params =
            serde_json::to_value(request).map_err(|err| TransportError::codec(P::NAME, err))?;

        let result = {
            let mut connection = self
                .connection
                .lock()
                .map_err(|_| TransportError::ConnectionPoisoned)?;
            connection.round_trip(P::NAME, params)
        };

        let value = result.map_err(lift_remote)?;
        debug!(target: TRANSPORT_TARGET, method = P::NAME, "call completed");
        serde_json::from_value(value)
            .map_err(|err| ClientError::from(TransportError::codec(P::NAME, err)))
    }
}

/// Promotes a host fault that carries a classification into a
/// [`ClassifiedError`] whose cause is the original fault. Every other
/// transport error is left intact.
fn lift_remote(error: TransportError) -> ClientError {
    match error {
        TransportError::Remote {
            method,
            code,
            message,
            data: Some(data),
        } => {
            let classification = ErrorData::deserialize(&data);
            let fault = TransportError::Remote {
                method,
                code,
                message: message.clone(),
                data: Some(data),
            };
            match classification {
                Ok(classification) => ClientError::Classified(
                    ClassifiedError::new(classification.code, classification.level, message)
                        .with_cause(fault),
                ),
                Err(_) => ClientError::Transport(fault),
            }
        }
        other => ClientError::Transport(other),
    }
}
