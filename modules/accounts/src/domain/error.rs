use thiserror::Error;

use crate::contract::model::ValidationFailures;

/// Failure taxonomy of the account service. Closed: callers match on the variant.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {failures}")]
    ValidationFailed { failures: ValidationFailures },

    #[error("Account not found: {username}")]
    NotFound { username: String },

    #[error("Username '{username}' is already taken")]
    UsernameTaken { username: String },

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Unexpected error: {message}")]
    Unexpected { message: String },
}

impl DomainError {
    pub fn validation_failed(failures: ValidationFailures) -> Self {
        Self::ValidationFailed { failures }
    }

    pub fn not_found(username: impl Into<String>) -> Self {
        Self::NotFound {
            username: username.into(),
        }
    }

    pub fn username_taken(username: impl Into<String>) -> Self {
        Self::UsernameTaken {
            username: username.into(),
        }
    }

    pub fn invalid_password() -> Self {
        Self::InvalidPassword
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }
}
