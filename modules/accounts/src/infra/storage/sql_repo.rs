use std::sync::Arc;

use async_trait::async_trait;
use db::DbHandle;
use tracing::debug;

use crate::contract::model::{AccountPatch, AccountProfile};
use crate::domain::model::Account;
use crate::domain::repo::{AccountsRepository, RepoError};
use crate::infra::storage::entity::{AccountRow, ProfileRow};

const FIND_BY_USERNAME: &str = "SELECT id, username, password, email FROM users WHERE username = $1";
const INSERT: &str = "INSERT INTO users (username, password, email) VALUES ($1, $2, $3) RETURNING id";
const UPDATE_PROFILE: &str =
    "UPDATE users SET username = $1, email = $2 WHERE username = $3 RETURNING id, username, email";
const UPDATE_PASSWORD: &str = "UPDATE users SET password = $1 WHERE username = $2";

/// `AccountsRepository` over the shared `users` table. Works on any engine
/// `DbHandle` connects to; every statement is a single parameterized round trip.
pub struct SqlAccountsRepository {
    db: Arc<DbHandle>,
}

impl SqlAccountsRepository {
    pub fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountsRepository for SqlAccountsRepository {
    async fn find_by_username(&self, username: &str) -> Result<Account, RepoError> {
        let row: AccountRow = sqlx::query_as(FIND_BY_USERNAME)
            .bind(username)
            .fetch_one(self.db.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> Result<i64, RepoError> {
        let id: i64 = sqlx::query_scalar(INSERT)
            .bind(username)
            .bind(password_hash)
            .bind(email)
            .fetch_one(self.db.pool())
            .await
            .map_err(map_sqlx_error)?;
        debug!(account_id = id, "Inserted users row");
        Ok(id)
    }

    async fn update_profile(
        &self,
        username: &str,
        patch: &AccountPatch,
    ) -> Result<AccountProfile, RepoError> {
        let row: ProfileRow = sqlx::query_as(UPDATE_PROFILE)
            .bind(patch.username.as_str())
            .bind(patch.email.as_str())
            .bind(username)
            .fetch_one(self.db.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<u64, RepoError> {
        let result = sqlx::query(UPDATE_PASSWORD)
            .bind(password_hash)
            .bind(username)
            .execute(self.db.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

fn map_sqlx_error(e: sqlx::Error) -> RepoError {
    if matches!(e, sqlx::Error::RowNotFound) {
        RepoError::NoRows
    } else if db::is_unique_violation(&e) {
        RepoError::UniqueViolation
    } else {
        RepoError::Other(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_no_rows() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            RepoError::NoRows
        ));
    }

    #[test]
    fn other_errors_are_wrapped() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, RepoError::Other(_)));
        assert!(err.to_string().contains("pool timed out"));
    }
}
