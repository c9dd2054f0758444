use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::contract::model::{AccountPatch, AccountProfile, NewAccount, PasswordChange};
use crate::domain::error::DomainError;
use crate::domain::model::Account;
use crate::domain::ports::PasswordHasher;
use crate::domain::repo::{AccountsRepository, RepoError};
use crate::domain::validation::{Validator, CREATE_FIELDS, UPDATE_FIELDS};

/// Domain service with the account rules.
/// Depends only on the repository and hasher ports, not on infra types.
///
/// Stateless between calls: every operation is validate -> lookup -> one write,
/// and nothing is written unless every preceding step succeeded.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn AccountsRepository>,
    hasher: Arc<dyn PasswordHasher>,
    validator: Arc<Validator>,
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        repo: Arc<dyn AccountsRepository>,
        hasher: Arc<dyn PasswordHasher>,
        validator: Arc<Validator>,
    ) -> Self {
        Self {
            repo,
            hasher,
            validator,
        }
    }

    #[instrument(
        name = "accounts.service.create",
        skip(self, new_account),
        fields(username = %new_account.username)
    )]
    pub async fn create(&self, new_account: NewAccount) -> Result<i64, DomainError> {
        info!("Creating account");

        self.validator
            .validate_partial(&new_account, CREATE_FIELDS)
            .map_err(DomainError::validation_failed)?;

        match self.get_by_username(&new_account.username).await {
            Ok(_) => return Err(DomainError::username_taken(new_account.username)),
            Err(DomainError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let NewAccount {
            username,
            email,
            password,
        } = new_account;
        let password_hash = self.hash_password(password).await?;

        // The lookup above is only a fast path; the UNIQUE constraint settles races.
        let id = self
            .repo
            .insert(&username, &password_hash, &email)
            .await
            .map_err(|e| map_write_error(e, &username))?;

        info!(account_id = id, "Successfully created account");
        Ok(id)
    }

    /// Get an account, password hash included. Callers outside the core get
    /// [`AccountProfile`] instead.
    #[instrument(name = "accounts.service.get", skip(self))]
    pub async fn get(&self, username: &str) -> Result<Account, DomainError> {
        debug!("Getting account by username");
        self.get_by_username(username).await
    }

    #[instrument(name = "accounts.service.sign_in", skip(self, password))]
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Account, DomainError> {
        debug!("Signing in");

        let account = self.get_by_username(username).await?;
        if !self
            .verify_password(password.to_owned(), account.password_hash.clone())
            .await?
        {
            warn!("Password mismatch");
            return Err(DomainError::invalid_password());
        }

        debug!(account_id = account.id, "Signed in");
        Ok(account)
    }

    #[instrument(
        name = "accounts.service.update",
        skip(self, patch),
        fields(new_username = %patch.username)
    )]
    pub async fn update(
        &self,
        username: &str,
        patch: AccountPatch,
    ) -> Result<AccountProfile, DomainError> {
        info!("Updating account");

        self.validator
            .validate_partial(&patch, UPDATE_FIELDS)
            .map_err(DomainError::validation_failed)?;

        // Update never creates: the account must exist under its current name.
        self.get_by_username(username).await?;

        let updated = self
            .repo
            .update_profile(username, &patch)
            .await
            .map_err(|e| match e {
                // Renamed or removed between the lookup and the update.
                RepoError::NoRows => DomainError::not_found(username),
                other => map_write_error(other, &patch.username),
            })?;

        info!(account_id = updated.id, "Successfully updated account");
        Ok(updated)
    }

    #[instrument(name = "accounts.service.change_password", skip(self, change))]
    pub async fn change_password(
        &self,
        username: &str,
        change: PasswordChange,
    ) -> Result<(), DomainError> {
        info!("Changing password");

        self.validator
            .validate(&change)
            .map_err(DomainError::validation_failed)?;

        let account = self.get_by_username(username).await?;

        let PasswordChange {
            current_password,
            new_password,
            ..
        } = change;
        if !self
            .verify_password(current_password, account.password_hash)
            .await?
        {
            warn!("Current password mismatch");
            return Err(DomainError::invalid_password());
        }

        let password_hash = self.hash_password(new_password).await?;
        let affected = self
            .repo
            .update_password(username, &password_hash)
            .await
            .map_err(|e| DomainError::unexpected(e.to_string()))?;
        if affected == 0 {
            return Err(DomainError::not_found(username));
        }

        info!("Successfully changed password");
        Ok(())
    }

    // --- helpers ---

    async fn get_by_username(&self, username: &str) -> Result<Account, DomainError> {
        self.repo
            .find_by_username(username)
            .await
            .map_err(|e| match e {
                RepoError::NoRows => DomainError::not_found(username),
                other => DomainError::unexpected(format!("{other:#}")),
            })
    }

    /// Hash on the blocking pool; the hasher is deliberately slow.
    async fn hash_password(&self, plaintext: String) -> Result<String, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| DomainError::unexpected(format!("hashing task failed: {e}")))?
            .map_err(|e| DomainError::unexpected(format!("password hashing failed: {e:#}")))
    }

    async fn verify_password(&self, plaintext: String, hash: String) -> Result<bool, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
            .await
            .map_err(|e| DomainError::unexpected(format!("verification task failed: {e}")))
    }
}

/// Classify a failed INSERT/UPDATE. A unique violation means someone else holds `username`.
fn map_write_error(e: RepoError, username: &str) -> DomainError {
    match e {
        RepoError::UniqueViolation => DomainError::username_taken(username),
        other => DomainError::unexpected(format!("{other:#}")),
    }
}
