use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::AccountsApi,
    error::AccountsError,
    model::{AccountPatch, AccountProfile, NewAccount, PasswordChange},
};
use crate::domain::service::Service;

/// Local implementation of the AccountsApi trait that delegates to the domain service
pub struct AccountsLocalClient {
    service: Arc<Service>,
}

impl AccountsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AccountsApi for AccountsLocalClient {
    async fn create_account(&self, new_account: NewAccount) -> Result<i64, AccountsError> {
        self.service
            .create(new_account)
            .await
            .map_err(AccountsError::from)
    }

    async fn get_account(&self, username: &str) -> Result<AccountProfile, AccountsError> {
        self.service
            .get(username)
            .await
            .map(AccountProfile::from)
            .map_err(AccountsError::from)
    }

    async fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountProfile, AccountsError> {
        self.service
            .sign_in(username, password)
            .await
            .map(AccountProfile::from)
            .map_err(AccountsError::from)
    }

    async fn update_account(
        &self,
        username: &str,
        patch: AccountPatch,
    ) -> Result<AccountProfile, AccountsError> {
        self.service
            .update(username, patch)
            .await
            .map_err(AccountsError::from)
    }

    async fn change_password(
        &self,
        username: &str,
        change: PasswordChange,
    ) -> Result<(), AccountsError> {
        self.service
            .change_password(username, change)
            .await
            .map_err(AccountsError::from)
    }
}
