//! Shared primitives for all Rust crates in Tessera.

#![forbid(unsafe_code)]

/// Numeric identities handed out by the backing store.
pub mod ids;

use serde::Serialize;
use thiserror::Error;

pub use ids::{DomainId, ResourceClassId, ResourceId};

/// Result type used across Tessera crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Creates a non-empty string from the trimmed input.
    ///
    /// Blank input is reported as a missing `what`, e.g. `"permission name required"`.
    pub fn required(value: &str, what: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Required(format!("{what} required")));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// A mandatory argument is missing or blank.
    #[error("{0}")]
    Required(String),

    /// Invalid input, unknown permission name or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced accessor, resource, resource class or domain does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Accessor is blocked by the effective permission set.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Stored data disagrees with the process-wide registries.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Internal unexpected error, including store failures.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn required_trims_and_names_missing_value() {
        let trimmed = NonEmptyString::required("  edit ", "permission name");
        assert_eq!(
            trimmed.map(String::from).unwrap_or_default(),
            "edit".to_owned()
        );

        let missing = NonEmptyString::required(" \t", "permission name");
        assert!(matches!(
            missing,
            Err(AppError::Required(message)) if message == "permission name required"
        ));
    }
}
