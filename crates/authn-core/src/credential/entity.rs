//! Credential Record Entity
//!
//! The source of truth for one principal: identifier, credential hash,
//! roles and account flags. Records are immutable values; a password change
//! builds a new record with the hash replaced wholesale.

use std::collections::HashSet;
use std::fmt;

use crate::principal::entity::{AccountStatus, Principal};
use crate::role::entity::Role;

#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    identifier: String,
    password_hash: String,
    roles: HashSet<Role>,
    account: AccountStatus,
}

impl CredentialRecord {
    pub fn new(identifier: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password_hash: password_hash.into(),
            roles: HashSet::new(),
            account: AccountStatus::default(),
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn with_account(mut self, account: AccountStatus) -> Self {
        self.account = account;
        self
    }

    /// Copy of this record with a new credential hash
    pub fn with_password_hash(&self, password_hash: impl Into<String>) -> Self {
        Self {
            password_hash: password_hash.into(),
            ..self.clone()
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn roles(&self) -> &HashSet<Role> {
        &self.roles
    }

    pub fn account(&self) -> AccountStatus {
        self.account
    }

    /// Materialize the caller-facing view of this record
    pub fn to_principal(&self) -> Principal {
        Principal::new(&self.identifier)
            .with_roles(self.roles.iter().cloned())
            .with_account(self.account)
    }
}

// Keep the hash out of every log line and panic message.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("identifier", &self.identifier)
            .field("password_hash", &"<redacted>")
            .field("roles", &self.roles)
            .field("account", &self.account)
            .finish()
    }
}
