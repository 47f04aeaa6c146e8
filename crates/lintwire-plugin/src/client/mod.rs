//! Plugin-side client for querying the host.
//!
//! Rules are written against the [`Runner`] trait. [`Client`] implements it
//! over a [`Connection`], issuing one host call per operation. Generic
//! helpers that cannot live on a trait object are provided by
//! [`RunnerExt`].

use lintwire_config::SocketEndpoint;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{BoxError, ClassifiedError, ClientError, ErrorCode, Severity, TransportError};
use crate::protocol::{
    Attribute, Attributes, AttributesRequest, EmitIssue, EmitIssueRequest, EvalExpr,
    EvalExprRequest, Expression, Metadata, Range,
};
use crate::rule::{Rule, RuleDescriptor};
use crate::severity;
use crate::transport::{CallGate, Connection, HostStream, StreamTransport};
use crate::value::{ConversionTarget, Destination, TypeShape, TypedValue, convert, decode};

/// Tracing target for client operations.
pub(crate) const CLIENT_TARGET: &str = "lintwire_plugin::client";

/// Metadata key under which [`Runner::emit_issue_on_expr`] records the
/// expression source.
pub const EXPR_META_KEY: &str = "expr";

/// Operations a rule may perform against the host.
pub trait Runner {
    /// Fetches the attributes named `attribute_name` on every `resource`
    /// block and passes each to `walker` in host order.
    ///
    /// Delivery stops at the first handler failure, which is returned
    /// unchanged. Wrap caller errors with [`ClientError::handler`].
    ///
    /// # Errors
    ///
    /// Returns the transport error when the query fails, or the handler's
    /// error.
    fn walk_resource_attributes(
        &self,
        resource: &str,
        attribute_name: &str,
        walker: &mut dyn FnMut(&Attribute) -> Result<(), ClientError>,
    ) -> Result<(), ClientError>;

    /// Evaluates `expr` on the host and decodes the result for `shape`.
    ///
    /// # Errors
    ///
    /// Returns a [`ErrorCode::TypeConversion`] error when `shape` is
    /// unsupported or the value cannot be coerced to it, and a
    /// [`ErrorCode::TypeMismatch`] error when the coerced value cannot be
    /// decoded. Transport faults propagate unchanged.
    fn evaluate_expr_as(
        &self,
        expr: &Expression,
        shape: &TypeShape,
    ) -> Result<TypedValue, ClientError>;

    /// Reports an issue found by `rule` at `location`.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the host cannot be reached.
    fn emit_issue(
        &self,
        rule: &dyn Rule,
        message: &str,
        location: &Range,
        meta: Metadata,
    ) -> Result<(), ClientError>;

    /// Reports an issue located at `expr`, recording its source under
    /// [`EXPR_META_KEY`].
    ///
    /// # Errors
    ///
    /// Returns the transport error when the host cannot be reached.
    fn emit_issue_on_expr(
        &self,
        rule: &dyn Rule,
        message: &str,
        expr: &Expression,
    ) -> Result<(), ClientError> {
        let mut meta = Metadata::new();
        meta.insert(
            EXPR_META_KEY.to_owned(),
            Value::String(expr.source().to_owned()),
        );
        self.emit_issue(rule, message, expr.range(), meta)
    }
}

/// Generic conveniences available on every [`Runner`], including trait
/// objects.
pub trait RunnerExt: Runner {
    /// Evaluates `expr` and decodes it into `T`.
    ///
    /// # Errors
    ///
    /// As [`Runner::evaluate_expr_as`]. A value that does not fit `T`, such
    /// as an `i32` overflow, is a [`ErrorCode::TypeMismatch`] error.
    fn evaluate_expr<T: Destination>(&self, expr: &Expression) -> Result<T, ClientError> {
        let typed = self.evaluate_expr_as(expr, &T::TARGET.shape())?;
        T::from_typed(typed).map_err(|cause| invalid_type(expr, ErrorCode::TypeMismatch, cause))
    }

    /// Runs `proceed` unless `result` failed; see
    /// [`severity::ensure_no_error`].
    ///
    /// # Errors
    ///
    /// Returns error-severity and unclassified failures unchanged.
    ///
    /// # Panics
    ///
    /// Panics when the error carries an unrecognised severity tag.
    fn ensure_no_error<T, F>(
        &self,
        result: Result<T, ClientError>,
        proceed: F,
    ) -> Result<(), ClientError>
    where
        F: FnOnce(T) -> Result<(), ClientError>,
    {
        severity::ensure_no_error(result, proceed)
    }
}

impl<R: Runner + ?Sized> RunnerExt for R {}

/// A [`Runner`] backed by a connection to the host.
pub struct Client<C> {
    gate: CallGate<C>,
}

impl<C: Connection> Client<C> {
    /// Creates a client over an established connection.
    #[must_use]
    pub const fn new(connection: C) -> Self {
        Self {
            gate: CallGate::new(connection),
        }
    }

    /// Consumes the client, returning the connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionPoisoned`] if a caller panicked
    /// mid-call.
    pub fn into_connection(self) -> Result<C, TransportError> {
        self.gate.into_inner()
    }
}

impl Client<StreamTransport<HostStream, HostStream>> {
    /// Dials the host at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns the transport error raised while connecting.
    pub fn connect(endpoint: &SocketEndpoint) -> Result<Self, ClientError> {
        Ok(Self::new(StreamTransport::connect(endpoint)?))
    }
}

impl<C: Connection> Runner for Client<C> {
    fn walk_resource_attributes(
        &self,
        resource: &str,
        attribute_name: &str,
        walker: &mut dyn FnMut(&Attribute) -> Result<(), ClientError>,
    ) -> Result<(), ClientError> {
        let request = AttributesRequest {
            resource: resource.to_owned(),
            attribute_name: attribute_name.to_owned(),
        };
        let attributes = self.gate.call::<Attributes>(&request)?;
        debug!(
            target: CLIENT_TARGET,
            resource,
            attribute_name,
            count = attributes.len(),
            "walking attributes"
        );
        for attribute in &attributes {
            walker(attribute)?;
        }
        Ok(())
    }

    fn evaluate_expr_as(
        &self,
        expr: &Expression,
        shape: &TypeShape,
    ) -> Result<TypedValue, ClientError> {
        let target = ConversionTarget::from_shape(shape)
            .map_err(|cause| invalid_type(expr, ErrorCode::TypeConversion, cause))?;
        let request = EvalExprRequest { expr: expr.clone() };
        let value = self.gate.call::<EvalExpr>(&request)?;
        let converted = convert(value, &target.shape())
            .map_err(|cause| invalid_type(expr, ErrorCode::TypeConversion, cause))?;
        decode(converted, target).map_err(|cause| invalid_type(expr, ErrorCode::TypeMismatch, cause))
    }

    fn emit_issue(
        &self,
        rule: &dyn Rule,
        message: &str,
        location: &Range,
        meta: Metadata,
    ) -> Result<(), ClientError> {
        let request = EmitIssueRequest {
            rule: RuleDescriptor::from_rule(rule),
            message: message.to_owned(),
            location: location.clone(),
            meta,
        };
        debug!(target: CLIENT_TARGET, rule = rule.name(), %location, "emitting issue");
        self.gate.call::<EmitIssue>(&request)
    }
}

/// Builds and logs the error raised when an expression's value does not fit
/// the requested type.
fn invalid_type(expr: &Expression, code: ErrorCode, cause: impl Into<BoxError>) -> ClientError {
    let range = expr.range();
    let classified = ClassifiedError::new(
        code,
        Severity::Error,
        format!(
            "Invalid type expression in {}:{}",
            range.filename, range.start.line
        ),
    )
    .with_cause(cause);
    error!(target: CLIENT_TARGET, %code, error = %classified, "expression type check failed");
    ClientError::Classified(classified)
}

#[cfg(test)]
mod tests;
