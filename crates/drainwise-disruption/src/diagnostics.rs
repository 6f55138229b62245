//! Diagnostic sink for recoverable input problems.
//!
//! Scoring never fails because one pod carries a malformed annotation; it
//! reports the problem here and carries on. Reporting is best effort.

use std::fmt::{Display, Formatter};

use tracing::warn;

/// A recoverable problem found while scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The pod deletion-cost annotation did not parse as a finite number.
    MalformedDeletionCost {
        /// `namespace/name` of the pod.
        pod: String,
        value: String,
        reason: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MalformedDeletionCost { pod, value, reason } => write!(
                f,
                "parsing {}={value} from pod {pod}, {reason}",
                crate::cost::POD_DELETION_COST_ANNOTATION
            ),
        }
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Emits diagnostics as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::MalformedDeletionCost { pod, value, reason } => {
                warn!(pod = %pod, value = %value, error = %reason, "ignoring malformed pod deletion cost");
            }
        }
    }
}

/// Drops every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn report(&self, _diagnostic: &Diagnostic) {}
}
