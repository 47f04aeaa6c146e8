//! Plugin-side client for the lintwire host protocol.
//!
//! A lint plugin runs as a child of the host and reports back over a
//! socket. Rules never see the host's configuration model directly. They
//! query it through a [`Runner`]:
//!
//! - [`Runner::walk_resource_attributes`] streams matching attributes to a
//!   handler, stopping at the first handler failure.
//! - [`RunnerExt::evaluate_expr`] evaluates an expression on the host and
//!   decodes the dynamic result into a Rust value through a closed
//!   conversion table (see [`value`]).
//! - [`Runner::emit_issue`] reports a finding against a rule descriptor.
//!
//! Failures carry a [`Severity`](error::Severity). [`severity::ensure_no_error`]
//! turns warnings into skipped steps and surfaces errors unchanged.
//!
//! # Example
//!
//! ```rust,no_run
//! use lintwire_config::Config;
//! use lintwire_plugin::error::ClientError;
//! use lintwire_plugin::rule::{Rule, RuleSeverity, RuleSet};
//! use lintwire_plugin::{Client, Runner, RunnerExt};
//!
//! struct InstanceTypeRule;
//!
//! impl Rule for InstanceTypeRule {
//!     fn name(&self) -> &str {
//!         "aws_instance_invalid_type"
//!     }
//!
//!     fn enabled(&self) -> bool {
//!         true
//!     }
//!
//!     fn severity(&self) -> RuleSeverity {
//!         RuleSeverity::Error
//!     }
//!
//!     fn check(&self, runner: &dyn Runner) -> Result<(), ClientError> {
//!         runner.walk_resource_attributes("aws_instance", "instance_type", &mut |attribute| {
//!             let result = runner.evaluate_expr::<String>(attribute.expr());
//!             runner.ensure_no_error(result, |instance_type| {
//!                 if instance_type.starts_with("t1.") {
//!                     runner.emit_issue_on_expr(self, "legacy instance type", attribute.expr())?;
//!                 }
//!                 Ok(())
//!             })
//!         })
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_from_env()?;
//! lintwire_plugin::telemetry::initialise(&config)?;
//! let client = Client::connect(config.host_socket())?;
//! let rules = RuleSet::new("aws", "0.1.0", vec![Box::new(InstanceTypeRule)]);
//! rules.check(&client)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod rule;
pub mod severity;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod transport;
pub mod value;

#[cfg(test)]
mod tests;

pub use self::client::{Client, Runner, RunnerExt};
pub use self::error::{ClassifiedError, ClientError, ErrorCode, Severity, TransportError};
pub use self::rule::{Rule, RuleDescriptor, RuleSet, RuleSeverity};
pub use self::value::{DynamicValue, TypeShape, TypedValue};
