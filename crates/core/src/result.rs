//! Match outcomes: success, breadcrumbed failure chains, and the
//! aggregated results the diff engine produces.
//!
//! Structural mismatches are data, never errors. A failure deep inside a
//! nested structure carries a dotted breadcrumb path (`content.field.0`)
//! pointing at the exact divergence, and may chain to the lower-level
//! failure that caused it.

use serde::Serialize;

/// Why a match failed, independent of the message text. Callers branch on
/// this instead of string-matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    PartNameMismatch,
}

/// The outcome of matching one value against one pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Success,
    Failure(MatchFailure),
}

impl MatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MatchResult::Success)
    }

    /// Annotate a failure with the field/index that produced it; success
    /// passes through untouched.
    pub fn with_breadcrumb(self, crumb: &str) -> MatchResult {
        match self {
            MatchResult::Success => MatchResult::Success,
            MatchResult::Failure(failure) => MatchResult::Failure(failure.with_breadcrumb(crumb)),
        }
    }

    pub fn into_failure(self) -> Option<MatchFailure> {
        match self {
            MatchResult::Success => None,
            MatchResult::Failure(failure) => Some(failure),
        }
    }
}

/// One structural mismatch, with the path to it and an optional chain of
/// underlying failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchFailure {
    pub message: String,
    pub breadcrumbs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<MatchFailure>>,
}

impl MatchFailure {
    pub fn new(message: impl Into<String>) -> Self {
        MatchFailure {
            message: message.into(),
            breadcrumbs: Vec::new(),
            reason: None,
            cause: None,
        }
    }

    pub fn with_reason(mut self, reason: FailureReason) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn with_cause(mut self, cause: MatchFailure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Prepend a breadcrumb as the failure propagates out of a child.
    pub fn with_breadcrumb(mut self, crumb: &str) -> Self {
        self.breadcrumbs.insert(0, crumb.to_string());
        self
    }

    /// Dotted path to the divergence, e.g. `content.field.0`.
    pub fn breadcrumb_path(&self) -> String {
        self.breadcrumbs.join(".")
    }

    /// Render this failure and its cause chain.
    pub fn report(&self) -> String {
        let mut out = if self.breadcrumbs.is_empty() {
            self.message.clone()
        } else {
            format!(">> {}\n\n   {}", self.breadcrumb_path(), self.message)
        };
        let mut cause = self.cause.as_deref();
        while let Some(failure) = cause {
            if failure.breadcrumbs.is_empty() {
                out.push_str(&format!("\n\n   caused by: {}", failure.message));
            } else {
                out.push_str(&format!(
                    "\n\n   caused by [{}]: {}",
                    failure.breadcrumb_path(),
                    failure.message
                ));
            }
            cause = failure.cause.as_deref();
        }
        out
    }
}

/// Aggregated divergences from a compatibility diff. The engine enumerates
/// every breaking change in one pass rather than stopping at the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffResults {
    pub failures: Vec<MatchFailure>,
}

impl DiffResults {
    pub fn new() -> Self {
        DiffResults::default()
    }

    /// Number of independent structural divergences found.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn push(&mut self, failure: MatchFailure) {
        self.failures.push(failure);
    }

    pub fn extend(&mut self, failures: impl IntoIterator<Item = MatchFailure>) {
        self.failures.extend(failures);
    }

    pub fn report(&self) -> String {
        self.failures
            .iter()
            .map(MatchFailure::report)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
