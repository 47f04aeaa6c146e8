//! Rule implementations and their transport-safe descriptors.
//!
//! A [`Rule`] lives only inside the plugin process. Whenever a rule has to be
//! named to the host, for example when emitting an issue, it is projected
//! into a [`RuleDescriptor`] first.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::Runner;
use crate::error::ClientError;

/// Tracing target for rule execution.
const RULE_TARGET: &str = "lintwire_plugin::rule";

/// Severity a rule reports its issues with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSeverity {
    /// The configuration is wrong and will fail.
    Error,
    /// The configuration works but is likely a mistake.
    Warning,
    /// Informational finding.
    Notice,
}

/// A check implemented by the plugin.
pub trait Rule {
    /// Unique rule name.
    fn name(&self) -> &str;

    /// Whether the rule runs by default.
    fn enabled(&self) -> bool;

    /// Severity attached to emitted issues.
    fn severity(&self) -> RuleSeverity;

    /// Optional documentation link.
    fn link(&self) -> Option<&str> {
        None
    }

    /// Inspects the configuration through the runner and emits issues.
    ///
    /// # Errors
    ///
    /// Returns any client error the check chooses not to absorb.
    fn check(&self, runner: &dyn Runner) -> Result<(), ClientError>;
}

/// Serializable projection of a [`Rule`].
///
/// # Example
///
/// ```
/// use lintwire_plugin::rule::{RuleDescriptor, RuleSeverity};
///
/// let descriptor = RuleDescriptor::new("no_public_ip", true, RuleSeverity::Warning, None);
/// assert_eq!(descriptor.name(), "no_public_ip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    name: String,
    enabled: bool,
    severity: RuleSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

impl RuleDescriptor {
    /// Creates a descriptor from its parts.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        enabled: bool,
        severity: RuleSeverity,
        link: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            enabled,
            severity,
            link,
        }
    }

    /// Projects a live rule into its descriptor.
    #[must_use]
    pub fn from_rule(rule: &dyn Rule) -> Self {
        Self::new(
            rule.name(),
            rule.enabled(),
            rule.severity(),
            rule.link().map(str::to_owned),
        )
    }

    /// Returns the rule name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns whether the rule is enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the rule severity.
    #[must_use]
    pub const fn severity(&self) -> RuleSeverity {
        self.severity
    }

    /// Returns the documentation link, if any.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}

/// A named, versioned collection of rules shipped by one plugin.
pub struct RuleSet {
    name: String,
    version: String,
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// Creates a rule set.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            rules,
        }
    }

    /// Returns the rule set name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the rule set version.
    #[must_use]
    pub const fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Returns descriptors for every rule, in registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<RuleDescriptor> {
        self.rules
            .iter()
            .map(|rule| RuleDescriptor::from_rule(rule.as_ref()))
            .collect()
    }

    /// Runs every enabled rule in registration order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing rule and returns
    /// [`ClientError::RuleCheck`] naming it.
    pub fn check(&self, runner: &dyn Runner) -> Result<(), ClientError> {
        for rule in self.rules.iter().filter(|rule| rule.enabled()) {
            debug!(target: RULE_TARGET, rule = rule.name(), "running check");
            rule.check(runner).map_err(|source| ClientError::RuleCheck {
                name: rule.name().to_owned(),
                source: Box::new(source),
            })?;
        }
        Ok(())
    }
}
