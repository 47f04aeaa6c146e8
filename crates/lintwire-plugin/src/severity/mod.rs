//! Resolution of classified errors into check outcomes.
//!
//! A check step either succeeded, or failed with an error that may carry a
//! [`Severity`]. The classifier maps that input to a [`Decision`]:
//!
//! | input | decision | continuation |
//! |---|---|---|
//! | success | [`Decision::Proceed`] | runs, its result is returned |
//! | warning | [`Decision::Skip`] | skipped, success is returned |
//! | error | [`Decision::Fail`] | skipped, the error is returned |
//! | no severity | [`Decision::Fail`] | skipped, the error is returned |
//! | unrecognised tag | aborts | never |
//!
//! An unrecognised tag means an error was built with a severity outside the
//! known set. Neither skipping nor failing is safe in that case, so the
//! classifier panics.

use tracing::debug;

pub use crate::error::Severity;
use crate::error::ClientError;

/// Tracing target for severity resolution.
const SEVERITY_TARGET: &str = "lintwire_plugin::severity";

/// Outcome of classifying a check step's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No error; continue with the check.
    Proceed,
    /// Advisory error; skip the rest of the check without failing.
    Skip,
    /// Fatal or unclassified error; abort the check.
    Fail,
}

/// Classifies an optional error.
///
/// # Panics
///
/// Panics when the error carries [`Severity::Unrecognized`].
#[must_use]
pub fn classify(outcome: Option<&ClientError>) -> Decision {
    let Some(error) = outcome else {
        return Decision::Proceed;
    };
    match error.severity() {
        Some(Severity::Warning) => Decision::Skip,
        Some(Severity::Error) | None => Decision::Fail,
        Some(Severity::Unrecognized(tag)) => unrecognized_severity(tag, error),
    }
}

/// Runs `proceed` with the successful value, or resolves the error by its
/// severity.
///
/// Warnings are absorbed and `proceed` is not run. Errors and failures
/// without a severity are returned unchanged.
///
/// # Errors
///
/// Returns the original error for [`Decision::Fail`], or whatever `proceed`
/// returns.
///
/// # Panics
///
/// Panics when the error carries [`Severity::Unrecognized`].
///
/// # Example
///
/// ```
/// use lintwire_plugin::error::{ClassifiedError, ClientError, ErrorCode, Severity};
/// use lintwire_plugin::severity::ensure_no_error;
///
/// let unknown: Result<String, ClientError> = Err(ClassifiedError::new(
///     ErrorCode::UnknownValue,
///     Severity::Warning,
///     "unknown until apply",
/// )
/// .into());
///
/// let mut ran = false;
/// ensure_no_error(unknown, |_| {
///     ran = true;
///     Ok(())
/// })
/// .expect("warnings are absorbed");
/// assert!(!ran);
/// ```
pub fn ensure_no_error<T, F>(result: Result<T, ClientError>, proceed: F) -> Result<(), ClientError>
where
    F: FnOnce(T) -> Result<(), ClientError>,
{
    match result {
        Ok(value) => proceed(value),
        Err(error) => match classify(Some(&error)) {
            Decision::Skip => {
                debug!(target: SEVERITY_TARGET, %error, "skipping check step on warning");
                Ok(())
            }
            Decision::Proceed | Decision::Fail => Err(error),
        },
    }
}

fn unrecognized_severity(tag: &str, error: &ClientError) -> ! {
    panic!("error carries unrecognised severity tag '{tag}': {error}")
}
