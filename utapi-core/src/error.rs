//! Error taxonomy for the metric-accounting engine.
//!
//! Three kinds, matching the engine's failure policy: a [`UtapiError::Precondition`]
//! is raised synchronously before any store I/O; a [`UtapiError::Internal`] wraps a
//! top-level batch failure or a per-command failure whose result feeds a later
//! write; degraded reads never produce an error value at all (a failed read
//! sub-command is logged and folded in as zero, see `utapi-reader`).

use std::fmt;

/// Errors the write and read paths can surface to their callers.
#[derive(Debug)]
pub enum UtapiError {
    /// A request or configuration violated a contract that could be checked
    /// without talking to the backing store (missing required field, wrong
    /// type, missing `component` configuration, malformed time range).
    Precondition(String),
    /// A backing-store batch failed outright, or a per-command failure
    /// occurred in a batch whose result is consumed by a later write (the
    /// second phase of an absolute-value update). The underlying cause is
    /// logged by the caller; callers only see this opaque message.
    Internal(String),
}

impl UtapiError {
    /// Build a [`UtapiError::Precondition`] from a displayable reason.
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition(reason.into())
    }

    /// Build a [`UtapiError::Internal`] from a displayable reason.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }

    /// `true` if this is a [`UtapiError::Precondition`].
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

impl fmt::Display for UtapiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precondition(msg) => write!(f, "precondition failed: {msg}"),
            // Deliberately opaque: the spec requires internal failures to surface
            // as "internal error" to the caller, with detail only in the log line.
            Self::Internal(_) => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for UtapiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_message_is_visible() {
        let err = UtapiError::precondition("missing newByteLength");
        assert!(format!("{err}").contains("missing newByteLength"));
        assert!(err.is_precondition());
    }

    #[test]
    fn internal_message_is_opaque() {
        let err = UtapiError::internal("pipeline transport reset by peer");
        assert_eq!(format!("{err}"), "internal error");
        assert!(!err.is_precondition());
    }
}
