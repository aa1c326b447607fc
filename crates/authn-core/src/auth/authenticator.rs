//! Authenticator
//!
//! Turns a claimed identifier and secret into a [`Principal`] or a typed
//! [`AuthFailure`]:
//!
//! 1. look up the credential record
//! 2. verify the secret against the stored hash
//! 3. check the account flags
//! 4. return the principal with the record's roles
//!
//! An unknown identifier still pays for one hash verification against a
//! decoy hash, so it costs the same as a wrong secret and does not reveal
//! which identifiers exist. There are no retries here; store outages surface
//! as [`AuthFailure::StoreUnavailable`] for the caller to retry.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::auth::password_service::PasswordService;
use crate::credential::store::CredentialStore;
use crate::principal::entity::Principal;
use crate::shared::error::{AuthFailure, Result};

/// Input for the decoy hash. Its value is irrelevant; only its cost matters.
const DECOY_SECRET: &str = "decoy-secret-for-unknown-principals";

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    passwords: Arc<PasswordService>,
    decoy_hash: Arc<str>,
}

impl Authenticator {
    /// Build the authenticator and compute the decoy hash once.
    pub fn new(store: Arc<dyn CredentialStore>, passwords: Arc<PasswordService>) -> Result<Self> {
        let decoy_hash = passwords.hash_password(DECOY_SECRET)?;

        Ok(Self {
            store,
            passwords,
            decoy_hash: Arc::from(decoy_hash),
        })
    }

    pub fn password_service(&self) -> &Arc<PasswordService> {
        &self.passwords
    }

    #[instrument(skip_all, fields(identifier = %identifier))]
    pub async fn authenticate(&self, identifier: &str, secret: &str) -> std::result::Result<Principal, AuthFailure> {
        let lookup = self.store.find_by_identifier(identifier).await;

        let record = match lookup {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Credential lookup failed");
                return Err(e.into());
            }
        };

        let Some(record) = record else {
            self.verify(secret, self.decoy_hash.to_string()).await;
            debug!(outcome = "unknown_principal", "Authentication rejected");
            return Err(AuthFailure::UnknownPrincipal);
        };

        if !self.verify(secret, record.password_hash().to_string()).await {
            debug!(outcome = "invalid_credential", "Authentication rejected");
            return Err(AuthFailure::InvalidCredential);
        }

        if let Err(state) = record.account().check() {
            info!(outcome = "account_state", reason = state.code(), "Authentication rejected");
            return Err(AuthFailure::AccountState(state));
        }

        if self.passwords.needs_rehash(record.password_hash()) {
            info!("Stored password hash uses outdated parameters");
        }

        debug!(roles = record.roles().len(), "Authentication succeeded");
        Ok(record.to_principal())
    }

    /// Hash verification is CPU bound, so it runs on the blocking pool.
    async fn verify(&self, secret: &str, hash: String) -> bool {
        let passwords = self.passwords.clone();
        let secret = secret.to_owned();

        match tokio::task::spawn_blocking(move || passwords.verify_password(&secret, &hash)).await {
            Ok(matched) => matched,
            Err(e) => {
                warn!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}
