//! The error type returned by individual [`crate::Datastore`] commands and by
//! [`crate::Datastore::batch`]'s top-level transport failure.

use std::fmt;

/// A backing-store command or transport failure.
#[derive(Debug, Clone)]
pub struct StoreError(String);

impl StoreError {
    /// Wrap a displayable cause.
    pub fn new(cause: impl Into<String>) -> Self {
        Self(cause.into())
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StoreError {}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self(err.to_string())
    }
}
