//! Development Data Seeder
//!
//! Provisions accounts through the credential store on startup. Existing
//! identifiers are left untouched, so restarting never resets a password.
//!
//! Default account:
//!   Ethan / password (role 1 = USER)

use std::sync::Arc;
use tracing::info;

use crate::auth::password_service::PasswordService;
use crate::credential::entity::CredentialRecord;
use crate::credential::store::{CredentialStore, SaveMode};
use crate::principal::entity::AccountStatus;
use crate::role::entity::{authorities, Role};
use crate::shared::error::{Result, StoreError};

/// Plain-text account description to be hashed and stored
#[derive(Debug, Clone)]
pub struct SeedAccount {
    pub identifier: String,
    pub password: String,
    pub roles: Vec<Role>,
    pub account: AccountStatus,
}

impl SeedAccount {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
            roles: Vec::new(),
            account: AccountStatus::default(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_account(mut self, account: AccountStatus) -> Self {
        self.account = account;
        self
    }

    /// The development user
    pub fn default_user() -> Self {
        Self::new("Ethan", "password").with_role(Role::new("1", authorities::USER))
    }
}

pub struct DevDataSeeder {
    store: Arc<dyn CredentialStore>,
    passwords: Arc<PasswordService>,
}

impl DevDataSeeder {
    pub fn new(store: Arc<dyn CredentialStore>, passwords: Arc<PasswordService>) -> Self {
        Self { store, passwords }
    }

    /// Create every account that does not exist yet. Returns how many were
    /// created.
    pub async fn seed(&self, accounts: &[SeedAccount]) -> Result<usize> {
        let mut created = 0;

        for account in accounts {
            if self.store.find_by_identifier(&account.identifier).await?.is_some() {
                info!(identifier = %account.identifier, "Seed account already exists, skipping");
                continue;
            }

            let hash = self.passwords.hash_password(&account.password)?;
            let record = CredentialRecord::new(&account.identifier, hash)
                .with_roles(account.roles.iter().cloned())
                .with_account(account.account);

            match self.store.save(record, SaveMode::CreateOnly).await {
                Ok(()) => {
                    created += 1;
                    info!(
                        identifier = %account.identifier,
                        roles = account.roles.len(),
                        "Created seed account"
                    );
                }
                // Another instance provisioned it between lookup and insert
                Err(StoreError::Conflict { .. }) => {
                    info!(identifier = %account.identifier, "Seed account already exists, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(created)
    }
}
