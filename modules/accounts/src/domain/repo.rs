use async_trait::async_trait;
use thiserror::Error;

use crate::contract::model::{AccountPatch, AccountProfile};
use crate::domain::model::Account;

/// Storage outcomes the domain needs to tell apart.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The statement matched no row.
    #[error("no matching row")]
    NoRows,

    /// A UNIQUE constraint (username) rejected the write.
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait AccountsRepository: Send + Sync {
    /// Single-row lookup by username.
    async fn find_by_username(&self, username: &str) -> Result<Account, RepoError>;

    /// Insert a row and return the id assigned by storage.
    async fn insert(&self, username: &str, password_hash: &str, email: &str)
        -> Result<i64, RepoError>;

    /// Set username/email on the row currently named `username`; returns the updated row.
    async fn update_profile(
        &self,
        username: &str,
        patch: &AccountPatch,
    ) -> Result<AccountProfile, RepoError>;

    /// Replace the password hash; returns the number of rows affected.
    async fn update_password(&self, username: &str, password_hash: &str)
        -> Result<u64, RepoError>;
}
