//! Shared primitives for all Rust crates in Rolegrid.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::UserIdentity;

/// Result type used across Rolegrid crates.
pub type AppResult<T> = Result<T, AppError>;

/// Sentence shown to operators when an operation fails for internal reasons.
pub const GENERIC_FAILURE_MESSAGE: &str = "The operation could not be completed. Please try again.";

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
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

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// User is not authenticated or not allowed to access a resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the message safe to surface to an operator.
    ///
    /// Caller-facing categories keep their detail. Internal failures are
    /// reduced to [`GENERIC_FAILURE_MESSAGE`]; their detail belongs in logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => GENERIC_FAILURE_MESSAGE.to_owned(),
            Self::Validation(detail)
            | Self::NotFound(detail)
            | Self::Conflict(detail)
            | Self::Unauthorized(detail)
            | Self::Forbidden(detail) => detail.clone(),
        }
    }

    /// Returns whether the error originates from infrastructure rather than input.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, GENERIC_FAILURE_MESSAGE, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_conversion_is_validated() {
        assert!(NonEmptyString::try_from(String::new()).is_err());
        assert!(NonEmptyString::try_from("manager".to_owned()).is_ok());
    }

    #[test]
    fn internal_errors_are_reduced_for_operators() {
        let error = AppError::Internal("connection reset by peer".to_owned());
        assert_eq!(error.public_message(), GENERIC_FAILURE_MESSAGE);
        assert!(error.is_internal());
    }

    #[test]
    fn not_found_keeps_its_detail() {
        let error = AppError::NotFound("role 'x' no longer exists".to_owned());
        assert_eq!(error.public_message(), "role 'x' no longer exists");
    }
}
