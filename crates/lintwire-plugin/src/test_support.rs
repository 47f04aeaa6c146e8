//! In-memory host doubles for exercising rules without a socket.
//!
//! Enabled for this crate's tests and, for downstream plugins, through the
//! `test-support` feature.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::protocol::{Attribute, Expression, Pos, Range};
use crate::transport::Connection;

/// One call observed by a [`ScriptedConnection`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Procedure name.
    pub method: String,
    /// Encoded request payload.
    pub params: Value,
}

/// Shared view of the calls a [`ScriptedConnection`] has received.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<RecordedCall>>>);

impl CallLog {
    fn record(&self, call: RecordedCall) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Returns every recorded call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the procedure names of every recorded call in order.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.method).collect()
    }
}

/// A connection that answers from a queue of scripted results.
///
/// Each call consumes the next queued result. Once the script is exhausted
/// every call fails with [`TransportError::ConnectionClosed`].
#[derive(Debug, Default)]
pub struct ScriptedConnection {
    script: VecDeque<Result<Value, TransportError>>,
    log: CallLog,
}

impl ScriptedConnection {
    /// Creates a connection with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful raw result.
    #[must_use]
    pub fn respond(mut self, value: Value) -> Self {
        self.script.push_back(Ok(value));
        self
    }

    /// Queues a successful result encoded from `payload`.
    ///
    /// A payload that cannot be encoded is queued as a codec failure.
    #[must_use]
    pub fn respond_with<T: Serialize>(mut self, payload: &T) -> Self {
        let entry =
            serde_json::to_value(payload).map_err(|err| TransportError::codec("scripted", err));
        self.script.push_back(entry);
        self
    }

    /// Queues a transport failure.
    #[must_use]
    pub fn fail(mut self, error: TransportError) -> Self {
        self.script.push_back(Err(error));
        self
    }

    /// Returns a handle on the calls this connection receives.
    #[must_use]
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }
}

impl Connection for ScriptedConnection {
    fn round_trip(&mut self, method: &str, params: Value) -> Result<Value, TransportError> {
        self.log.record(RecordedCall {
            method: method.to_owned(),
            params,
        });
        self.script
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::ConnectionClosed {
                    method: method.to_owned(),
                })
            })
    }
}

/// Range spanning `line` of `main.tf`, columns 1 to 10.
#[must_use]
pub fn range_on_line(line: u32) -> Range {
    Range::new("main.tf", Pos::new(line, 1, 0), Pos::new(line, 10, 9))
}

/// Builds an attribute named `name` whose expression source is `source`,
/// located on `line` of `main.tf`.
#[must_use]
pub fn attribute(name: &str, source: &str, line: u32) -> Attribute {
    let range = range_on_line(line);
    Attribute::new(
        name,
        Expression::new(source, range.clone()),
        range.clone(),
        range,
    )
}
