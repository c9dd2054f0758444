use async_trait::async_trait;

use crate::contract::error::AccountsError;
use crate::contract::model::{AccountPatch, AccountProfile, NewAccount, PasswordChange};

/// Public API trait for the accounts module that other modules can use.
///
/// Results never carry password hashes.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Create an account and return its storage-assigned id.
    async fn create_account(&self, new_account: NewAccount) -> Result<i64, AccountsError>;

    /// Get an account by username.
    async fn get_account(&self, username: &str) -> Result<AccountProfile, AccountsError>;

    /// Check credentials and return the matching account.
    async fn sign_in(&self, username: &str, password: &str)
        -> Result<AccountProfile, AccountsError>;

    /// Replace username and email of an existing account.
    async fn update_account(
        &self,
        username: &str,
        patch: AccountPatch,
    ) -> Result<AccountProfile, AccountsError>;

    /// Change the password after checking the current one.
    async fn change_password(
        &self,
        username: &str,
        change: PasswordChange,
    ) -> Result<(), AccountsError>;
}
