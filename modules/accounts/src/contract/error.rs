use thiserror::Error;

use crate::contract::model::ValidationFailures;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountsError {
    #[error("Validation failed: {failures}")]
    ValidationFailed { failures: ValidationFailures },

    #[error("Account not found: {username}")]
    NotFound { username: String },

    #[error("Username '{username}' is already taken")]
    UsernameTaken { username: String },

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Unexpected error")]
    Unexpected,
}

impl AccountsError {
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

    pub fn unexpected() -> Self {
        Self::Unexpected
    }
}

impl From<crate::domain::error::DomainError> for AccountsError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            ValidationFailed { failures } => Self::validation_failed(failures),
            NotFound { username } => Self::not_found(username),
            UsernameTaken { username } => Self::username_taken(username),
            InvalidPassword => Self::invalid_password(),
            Unexpected { .. } => Self::unexpected(),
        }
    }
}
