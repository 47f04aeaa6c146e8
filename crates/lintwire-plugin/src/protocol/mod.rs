//! Typed request and response contracts for host procedures.
//!
//! Each remote procedure is bound to exactly one request type and one response
//! type through the [`Procedure`] trait, so the call gate never has to match a
//! method name against a payload at runtime. Everything in this module is
//! plain data: no behaviour crosses the process boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::rule::RuleDescriptor;
use crate::value::DynamicValue;

/// Free-form metadata attached to an emitted issue.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A position in a configuration source file.
///
/// Lines and columns are one-based; `byte` is the zero-based byte offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    /// One-based line number.
    pub line: u32,
    /// One-based column number.
    pub column: u32,
    /// Zero-based byte offset into the file.
    pub byte: u32,
}

impl Pos {
    /// Creates a position.
    #[must_use]
    pub const fn new(line: u32, column: u32, byte: u32) -> Self {
        Self { line, column, byte }
    }
}

/// A half-open span of a configuration source file.
///
/// # Example
///
/// ```
/// use lintwire_plugin::protocol::{Pos, Range};
///
/// let range = Range::new("main.tf", Pos::new(3, 19, 42), Pos::new(3, 30, 53));
/// assert_eq!(range.to_string(), "main.tf:3,19-30");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Name of the file as known to the host.
    pub filename: String,
    /// Start position (inclusive).
    pub start: Pos,
    /// End position (exclusive).
    pub end: Pos,
}

impl Range {
    /// Creates a range.
    #[must_use]
    pub fn new(filename: impl Into<String>, start: Pos, end: Pos) -> Self {
        Self {
            filename: filename.into(),
            start,
            end,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(
                f,
                "{}:{},{}-{}",
                self.filename, self.start.line, self.start.column, self.end.column
            )
        } else {
            write!(
                f,
                "{}:{},{}-{},{}",
                self.filename, self.start.line, self.start.column, self.end.line, self.end.column
            )
        }
    }
}

/// An unevaluated configuration expression.
///
/// The host owns the parser; the plugin only ever holds the source text and
/// where it came from, and hands both back when asking for evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    source: String,
    range: Range,
}

impl Expression {
    /// Creates an expression from its source text and location.
    #[must_use]
    pub fn new(source: impl Into<String>, range: Range) -> Self {
        Self {
            source: source.into(),
            range,
        }
    }

    /// Returns the expression source text.
    #[must_use]
    pub const fn source(&self) -> &str {
        self.source.as_str()
    }

    /// Returns the location of the expression.
    #[must_use]
    pub const fn range(&self) -> &Range {
        &self.range
    }
}

/// A named configuration field returned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    expr: Expression,
    range: Range,
    name_range: Range,
}

impl Attribute {
    /// Creates an attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, expr: Expression, range: Range, name_range: Range) -> Self {
        Self {
            name: name.into(),
            expr,
            range,
            name_range,
        }
    }

    /// Returns the attribute name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the attribute's value expression.
    #[must_use]
    pub const fn expr(&self) -> &Expression {
        &self.expr
    }

    /// Returns the range of the whole `name = value` definition.
    #[must_use]
    pub const fn range(&self) -> &Range {
        &self.range
    }

    /// Returns the range of the attribute name alone.
    #[must_use]
    pub const fn name_range(&self) -> &Range {
        &self.name_range
    }
}

/// Filter selecting attributes of a resource type or address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributesRequest {
    /// Resource type (e.g. `aws_instance`) or full resource address.
    pub resource: String,
    /// Attribute name to collect from each matching resource.
    pub attribute_name: String,
}

/// Expression handed to the host for evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalExprRequest {
    /// Expression to evaluate.
    pub expr: Expression,
}

/// A diagnostic finding reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitIssueRequest {
    /// Transport-safe projection of the rule that raised the issue.
    pub rule: RuleDescriptor,
    /// Human-readable message.
    pub message: String,
    /// Location the issue refers to.
    pub location: Range,
    /// Free-form metadata.
    #[serde(default)]
    pub meta: Metadata,
}

/// A remote procedure with exactly one request and one response shape.
pub trait Procedure {
    /// Name the host dispatches on.
    const NAME: &'static str;
    /// Request payload.
    type Request: Serialize;
    /// Response payload.
    type Response: DeserializeOwned;
}

/// `Plugin.Attributes`: collect attributes matching a filter.
#[derive(Debug, Clone, Copy)]
pub enum Attributes {}

impl Procedure for Attributes {
    const NAME: &'static str = "Plugin.Attributes";
    type Request = AttributesRequest;
    type Response = Vec<Attribute>;
}

/// `Plugin.EvalExpr`: evaluate an expression in the host's context.
#[derive(Debug, Clone, Copy)]
pub enum EvalExpr {}

impl Procedure for EvalExpr {
    const NAME: &'static str = "Plugin.EvalExpr";
    type Request = EvalExprRequest;
    type Response = DynamicValue;
}

/// `Plugin.EmitIssue`: report a finding. The host acknowledges with null.
#[derive(Debug, Clone, Copy)]
pub enum EmitIssue {}

impl Procedure for EmitIssue {
    const NAME: &'static str = "Plugin.EmitIssue";
    type Request = EmitIssueRequest;
    type Response = ();
}
