//! Errors raised while talking to the host process.
//!
//! Failures fall into three families. [`TransportError`] covers the
//! connection itself and is always propagated as-is. [`ClassifiedError`]
//! carries a stable [`ErrorCode`] and a [`Severity`] tag that decides whether
//! a check is skipped or aborted. Caller failures raised inside an attribute
//! walk travel as [`ClientError::Handler`]. I/O and codec errors are wrapped
//! in `Arc` to satisfy the `result_large_err` Clippy lint.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error type accepted from caller-supplied handlers.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failures of the connection to the host.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading from or writing to the connection failed.
    #[error("I/O error on host connection: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// A payload could not be encoded or decoded.
    #[error("failed to encode or decode '{method}' payload: {source}")]
    Codec {
        /// Procedure whose payload failed.
        method: String,
        /// Underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// The host closed the connection before answering.
    #[error("host connection closed while awaiting '{method}'")]
    ConnectionClosed {
        /// Procedure that was awaiting a response.
        method: String,
    },

    /// The host answered a different request than the one outstanding.
    #[error("response id {actual:?} does not match request id {expected}")]
    UnexpectedResponse {
        /// Identifier of the outstanding request.
        expected: i64,
        /// Identifier carried by the response, if any.
        actual: Option<i64>,
    },

    /// The host reported a fault while serving the procedure.
    #[error("host rejected '{method}': {message} (code: {code})")]
    Remote {
        /// Procedure that failed.
        method: String,
        /// Protocol-level error code.
        code: i64,
        /// Message supplied by the host.
        message: String,
        /// Optional structured payload attached by the host.
        data: Option<serde_json::Value>,
    },

    /// Another caller panicked while holding the connection.
    #[error("host connection lock poisoned")]
    ConnectionPoisoned,
}

impl From<io::Error> for TransportError {
    fn from(source: io::Error) -> Self {
        Self::Io {
            source: Arc::new(source),
        }
    }
}

impl TransportError {
    /// Builds a codec error for the named procedure.
    #[must_use]
    pub fn codec(method: &str, source: serde_json::Error) -> Self {
        Self::Codec {
            method: method.to_owned(),
            source: Arc::new(source),
        }
    }
}

/// Stable error codes shared with the host.
///
/// Serialised as integers so both sides agree without sharing type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum ErrorCode {
    /// Evaluation failed for a reason not covered below.
    Evaluation,
    /// The expression depends on a value unknown until apply time.
    UnknownValue,
    /// The expression evaluated to null.
    NullValue,
    /// The value could not be coerced into the requested type.
    TypeConversion,
    /// The coerced value could not be decoded into the destination.
    TypeMismatch,
    /// The expression cannot be evaluated statically.
    Unevaluable,
    /// An attribute appeared where none was expected.
    UnexpectedAttribute,
    /// An external API call made by the host failed.
    ExternalApi,
    /// The evaluation context could not be prepared.
    Context,
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Evaluation => 0,
            ErrorCode::UnknownValue => 1,
            ErrorCode::NullValue => 2,
            ErrorCode::TypeConversion => 3,
            ErrorCode::TypeMismatch => 4,
            ErrorCode::Unevaluable => 5,
            ErrorCode::UnexpectedAttribute => 6,
            ErrorCode::ExternalApi => 10,
            ErrorCode::Context => 11,
        }
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = UnknownErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Evaluation),
            1 => Ok(Self::UnknownValue),
            2 => Ok(Self::NullValue),
            3 => Ok(Self::TypeConversion),
            4 => Ok(Self::TypeMismatch),
            5 => Ok(Self::Unevaluable),
            6 => Ok(Self::UnexpectedAttribute),
            10 => Ok(Self::ExternalApi),
            11 => Ok(Self::Context),
            other => Err(UnknownErrorCode(other)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Evaluation => "EvaluationError",
            Self::UnknownValue => "UnknownValueError",
            Self::NullValue => "NullValueError",
            Self::TypeConversion => "TypeConversionError",
            Self::TypeMismatch => "TypeMismatchError",
            Self::Unevaluable => "UnevaluableError",
            Self::UnexpectedAttribute => "UnexpectedAttributeError",
            Self::ExternalApi => "ExternalAPIError",
            Self::Context => "ContextError",
        };
        f.write_str(name)
    }
}

/// A numeric error code outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown error code {0}")]
pub struct UnknownErrorCode(pub u16);

/// How severe a classified error is for the check that raised it.
///
/// Tags arriving from the host that are not recognised are preserved in
/// [`Severity::Unrecognized`] so the classifier can reject them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    /// Fatal to the current check.
    Error,
    /// Advisory; the affected check is skipped.
    Warning,
    /// A tag outside the known set.
    Unrecognized(String),
}

impl From<String> for Severity {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "error" => Self::Error,
            "warning" => Self::Warning,
            _ => Self::Unrecognized(tag),
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::from("error"),
            Severity::Warning => Self::from("warning"),
            Severity::Unrecognized(tag) => tag,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
            Self::Unrecognized(tag) => write!(f, "unrecognized({tag})"),
        }
    }
}

/// An error tagged with a code and a severity.
///
/// # Example
///
/// ```
/// use lintwire_plugin::error::{ClassifiedError, ErrorCode, Severity};
///
/// let error = ClassifiedError::new(
///     ErrorCode::UnknownValue,
///     Severity::Warning,
///     "value is unknown until apply",
/// );
/// assert_eq!(error.severity(), &Severity::Warning);
/// assert_eq!(error.to_string(), "value is unknown until apply");
/// ```
#[derive(Debug)]
pub struct ClassifiedError {
    code: ErrorCode,
    severity: Severity,
    message: String,
    cause: Option<BoxError>,
}

impl ClassifiedError {
    /// Creates a classified error without an underlying cause.
    #[must_use]
    pub fn new(code: ErrorCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            cause: None,
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns the stable error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the severity tag.
    #[must_use]
    pub const fn severity(&self) -> &Severity {
        &self.severity
    }

    /// Returns the human-readable message without the cause.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the underlying cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, "; {cause}")?;
        }
        Ok(())
    }
}

impl StdError for ClassifiedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Errors returned by the plugin-side client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The connection to the host failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A severity-tagged failure raised locally or reported by the host.
    #[error(transparent)]
    Classified(#[from] ClassifiedError),

    /// A caller-supplied handler failed during an attribute walk.
    #[error("attribute handler failed: {0}")]
    Handler(#[source] BoxError),

    /// A rule's check failed.
    #[error("failed to check '{name}' rule: {source}")]
    RuleCheck {
        /// Name of the rule.
        name: String,
        /// Failure raised by the check.
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// Wraps a caller failure raised inside an attribute handler.
    #[must_use]
    pub fn handler(error: impl Into<BoxError>) -> Self {
        Self::Handler(error.into())
    }

    /// Returns the classified payload when this error carries a severity.
    #[must_use]
    pub const fn as_classified(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Classified(error) => Some(error),
            Self::Transport(_) | Self::Handler(_) | Self::RuleCheck { .. } => None,
        }
    }

    /// Returns the severity tag, if the error is classified.
    #[must_use]
    pub fn severity(&self) -> Option<&Severity> {
        self.as_classified().map(ClassifiedError::severity)
    }
}
