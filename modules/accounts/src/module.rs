use std::sync::Arc;

use anyhow::Context;
use db::DbHandle;
use tracing::info;

use crate::config::AccountsConfig;
use crate::contract::client::AccountsApi;
use crate::domain::service::Service;
use crate::domain::validation::Validator;
use crate::gateways::local::AccountsLocalClient;
use crate::infra::hashing::Argon2PasswordHasher;
use crate::infra::storage::SqlAccountsRepository;

/// Accounts module: wires the SQL repository and the Argon2 hasher into the
/// domain service and hands out the in-process client.
#[derive(Clone)]
pub struct Accounts {
    service: Arc<Service>,
}

impl Accounts {
    pub fn init(db: Arc<DbHandle>, cfg: &AccountsConfig) -> anyhow::Result<Self> {
        let hasher = Argon2PasswordHasher::new(cfg).context("Failed to build password hasher")?;
        let repo = SqlAccountsRepository::new(db);

        let service = Service::new(
            Arc::new(repo),
            Arc::new(hasher),
            Arc::new(Validator::new()),
        );

        info!(
            memory_kib = cfg.memory_kib,
            iterations = cfg.iterations,
            parallelism = cfg.parallelism,
            "Accounts module initialized"
        );
        Ok(Self {
            service: Arc::new(service),
        })
    }

    /// In-process client for other modules and the CLI.
    pub fn client(&self) -> Arc<dyn AccountsApi> {
        Arc::new(AccountsLocalClient::new(self.service.clone()))
    }
}
