//! End-to-end behavior of the accounts service over an in-memory SQLite database.

mod common;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use db::DbHandle;

use accounts::contract::model::{AccountPatch, AccountProfile, NewAccount, PasswordChange};
use accounts::domain::error::DomainError;
use accounts::domain::model::Account;
use accounts::domain::repo::{AccountsRepository, RepoError};
use accounts::domain::service::Service;
use accounts::domain::validation::Validator;
use accounts::error::AccountsError;
use accounts::infra::hashing::Argon2PasswordHasher;
use accounts::infra::storage::SqlAccountsRepository;

fn new_account(username: &str, email: &str, password: &str) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn test_account() -> NewAccount {
    new_account("test", "test@test.com", "abcdefgh")
}

fn password_change(current: &str, new: &str, confirm: &str) -> PasswordChange {
    PasswordChange {
        current_password: current.to_string(),
        new_password: new.to_string(),
        confirm_password: confirm.to_string(),
    }
}

#[tokio::test]
async fn create_then_get_round_trip() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;

    let id = service.create(test_account()).await?;
    assert!(id > 0);

    let account = service.get("test").await?;
    assert_eq!(account.id, id);
    assert_eq!(account.username, "test");
    assert_eq!(account.email, "test@test.com");
    assert_ne!(account.password_hash, "abcdefgh");
    assert!(!account.password_hash.is_empty());

    Ok(())
}

#[tokio::test]
async fn ids_are_assigned_by_storage() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;

    let first = service.create(test_account()).await?;
    let second = service
        .create(new_account("other", "other@test.com", "abcdefgh"))
        .await?;
    assert_ne!(first, second);

    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_rejected() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;

    service.create(test_account()).await?;
    let err = service
        .create(new_account("test", "someone.else@test.com", "different1"))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::UsernameTaken { ref username } if username == "test"));
    // The first account is untouched.
    assert_eq!(service.get("test").await?.email, "test@test.com");

    Ok(())
}

/// SQL repository that lets another writer insert the username right after a
/// lookup misses, so the service's insert hits the real UNIQUE constraint.
struct ConcurrentWriterRepo {
    inner: SqlAccountsRepository,
    db: Arc<DbHandle>,
}

#[async_trait]
impl AccountsRepository for ConcurrentWriterRepo {
    async fn find_by_username(&self, username: &str) -> Result<Account, RepoError> {
        let found = self.inner.find_by_username(username).await;
        if matches!(found, Err(RepoError::NoRows)) {
            sqlx::query("INSERT INTO users (username, password, email) VALUES ($1, $2, $3)")
                .bind(username)
                .bind("winner-hash")
                .bind("winner@test.com")
                .execute(self.db.pool())
                .await
                .map_err(|e| RepoError::Other(e.into()))?;
        }
        found
    }

    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> Result<i64, RepoError> {
        self.inner.insert(username, password_hash, email).await
    }

    async fn update_profile(
        &self,
        username: &str,
        patch: &AccountPatch,
    ) -> Result<AccountProfile, RepoError> {
        self.inner.update_profile(username, patch).await
    }

    async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<u64, RepoError> {
        self.inner.update_password(username, password_hash).await
    }
}

#[tokio::test]
async fn insert_race_on_real_constraint_reports_username_taken() -> Result<()> {
    let db = common::sqlite_db().await?;
    let repo = ConcurrentWriterRepo {
        inner: SqlAccountsRepository::new(db.clone()),
        db: db.clone(),
    };
    let service = Service::new(
        Arc::new(repo),
        Arc::new(Argon2PasswordHasher::new(&common::cheap_hashing())?),
        Arc::new(Validator::new()),
    );

    let err = service.create(test_account()).await.unwrap_err();
    assert!(matches!(err, DomainError::UsernameTaken { ref username } if username == "test"));

    // The concurrent writer's row is the one that stays.
    let stored = common::sql_service(db)?.get("test").await?;
    assert_eq!(stored.email, "winner@test.com");

    Ok(())
}

#[tokio::test]
async fn empty_create_reports_three_required_failures() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;

    let err = service
        .create(new_account("", "", ""))
        .await
        .unwrap_err();

    match err {
        DomainError::ValidationFailed { failures } => {
            assert_eq!(failures.len(), 3);
            assert!(failures.contains("username", "required"));
            assert!(failures.contains("email", "required"));
            assert!(failures.contains("password", "required"));
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn invalid_create_writes_nothing() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;

    let err = service
        .create(new_account("test", "invalid", "test"))
        .await
        .unwrap_err();
    match err {
        DomainError::ValidationFailed { failures } => {
            assert_eq!(failures.len(), 2);
            assert!(failures.contains("email", "email"));
            assert!(failures.contains("password", "min"));
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }

    assert!(matches!(
        service.get("test").await,
        Err(DomainError::NotFound { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn get_unknown_username_is_not_found() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;

    let err = service.get("ghost").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { ref username } if username == "ghost"));

    Ok(())
}

#[tokio::test]
async fn sign_in_checks_the_password() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;
    let id = service.create(test_account()).await?;

    let account = service.sign_in("test", "abcdefgh").await?;
    assert_eq!(account.id, id);
    assert_eq!(account.username, "test");

    assert!(matches!(
        service.sign_in("test", "wrong123").await,
        Err(DomainError::InvalidPassword)
    ));
    assert!(matches!(
        service.sign_in("ghost", "abcdefgh").await,
        Err(DomainError::NotFound { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn update_replaces_username_and_email() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;
    let id = service.create(test_account()).await?;

    let updated = service
        .update(
            "test",
            AccountPatch {
                username: "renamed".into(),
                email: "renamed@test.com".into(),
            },
        )
        .await?;
    assert_eq!(updated.id, id);
    assert_eq!(updated.username, "renamed");
    assert_eq!(updated.email, "renamed@test.com");

    // The old name is gone; the password moved with the row.
    assert!(matches!(
        service.get("test").await,
        Err(DomainError::NotFound { .. })
    ));
    service.sign_in("renamed", "abcdefgh").await?;

    Ok(())
}

#[tokio::test]
async fn update_of_missing_account_is_not_found() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;

    let patch = AccountPatch {
        username: "ghost2".into(),
        email: "ghost@test.com".into(),
    };
    assert!(matches!(
        service.update("ghost", patch.clone()).await,
        Err(DomainError::NotFound { ref username }) if username == "ghost"
    ));

    // Renamed away: the old name no longer resolves.
    service.create(test_account()).await?;
    service
        .update(
            "test",
            AccountPatch {
                username: "renamed".into(),
                email: "test@test.com".into(),
            },
        )
        .await?;
    assert!(matches!(
        service.update("test", patch).await,
        Err(DomainError::NotFound { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn update_to_a_taken_username_is_rejected() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;
    service.create(test_account()).await?;
    service
        .create(new_account("other", "other@test.com", "abcdefgh"))
        .await?;

    let err = service
        .update(
            "other",
            AccountPatch {
                username: "test".into(),
                email: "other@test.com".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::UsernameTaken { ref username } if username == "test"));

    // Keeping the current name is not a conflict.
    let same = service
        .update(
            "other",
            AccountPatch {
                username: "other".into(),
                email: "new@test.com".into(),
            },
        )
        .await?;
    assert_eq!(same.email, "new@test.com");

    Ok(())
}

#[tokio::test]
async fn update_validates_before_touching_storage() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;
    service.create(test_account()).await?;

    let err = service
        .update(
            "test",
            AccountPatch {
                username: String::new(),
                email: "not-an-email".into(),
            },
        )
        .await
        .unwrap_err();
    match err {
        DomainError::ValidationFailed { failures } => {
            assert_eq!(failures.len(), 2);
            assert!(failures.contains("username", "required"));
            assert!(failures.contains("email", "email"));
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
    assert_eq!(service.get("test").await?.email, "test@test.com");

    Ok(())
}

#[tokio::test]
async fn change_password_replaces_the_credential() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;
    service.create(test_account()).await?;
    let old_hash = service.get("test").await?.password_hash;

    service
        .change_password("test", password_change("abcdefgh", "newpass99", "newpass99"))
        .await?;

    assert_ne!(service.get("test").await?.password_hash, old_hash);
    assert!(matches!(
        service.sign_in("test", "abcdefgh").await,
        Err(DomainError::InvalidPassword)
    ));
    service.sign_in("test", "newpass99").await?;

    Ok(())
}

#[tokio::test]
async fn change_password_confirm_mismatch_keeps_old_password() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;
    service.create(test_account()).await?;

    let err = service
        .change_password("test", password_change("abcdefgh", "newpass99", "newpass98"))
        .await
        .unwrap_err();
    match err {
        DomainError::ValidationFailed { failures } => {
            assert!(failures.contains("confirm_password", "eqfield"));
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }

    service.sign_in("test", "abcdefgh").await?;
    assert!(matches!(
        service.sign_in("test", "newpass99").await,
        Err(DomainError::InvalidPassword)
    ));

    Ok(())
}

#[tokio::test]
async fn change_password_requires_the_current_password() -> Result<()> {
    let (service, _db) = common::sqlite_service().await?;
    service.create(test_account()).await?;

    assert!(matches!(
        service
            .change_password("test", password_change("wrong123", "newpass99", "newpass99"))
            .await,
        Err(DomainError::InvalidPassword)
    ));
    assert!(matches!(
        service
            .change_password("ghost", password_change("abcdefgh", "newpass99", "newpass99"))
            .await,
        Err(DomainError::NotFound { .. })
    ));
    service.sign_in("test", "abcdefgh").await?;

    Ok(())
}

#[tokio::test]
async fn client_exposes_profiles_and_contract_errors() -> Result<()> {
    let (module, _db) = common::sqlite_module().await?;
    let client = module.client();

    let id = client.create_account(test_account()).await?;
    let profile = client.get_account("test").await?;
    assert_eq!(profile.id, id);
    assert_eq!(profile.email, "test@test.com");

    let signed_in = client.sign_in("test", "abcdefgh").await?;
    assert_eq!(signed_in, profile);

    assert_eq!(
        client.create_account(test_account()).await.unwrap_err(),
        AccountsError::username_taken("test")
    );
    assert_eq!(
        client.sign_in("test", "wrong123").await.unwrap_err(),
        AccountsError::InvalidPassword
    );
    assert_eq!(
        client.get_account("ghost").await.unwrap_err(),
        AccountsError::not_found("ghost")
    );

    let updated = client
        .update_account(
            "test",
            AccountPatch {
                username: "renamed".into(),
                email: "renamed@test.com".into(),
            },
        )
        .await?;
    assert_eq!(updated.id, id);

    client
        .change_password(
            "renamed",
            password_change("abcdefgh", "newpass99", "newpass99"),
        )
        .await?;
    client.sign_in("renamed", "newpass99").await?;

    Ok(())
}
