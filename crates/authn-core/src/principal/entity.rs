//! Principal Entity
//!
//! The identity handed to callers after a successful authentication: an
//! identifier, its role set, and the account flags it was admitted under.
//! Principals are views built from a credential record on every lookup and
//! never carry the credential hash.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::role::entity::Role;
use crate::shared::error::AccountStateFailure;

/// Account state flags gating an otherwise valid credential match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    pub account_non_expired: bool,
    pub account_non_locked: bool,
    pub credentials_non_expired: bool,
    pub enabled: bool,
}

impl Default for AccountStatus {
    fn default() -> Self {
        Self {
            account_non_expired: true,
            account_non_locked: true,
            credentials_non_expired: true,
            enabled: true,
        }
    }
}

impl AccountStatus {
    /// First failing flag, checked as expired, locked, credentials expired,
    /// disabled.
    pub fn check(&self) -> Result<(), AccountStateFailure> {
        if !self.account_non_expired {
            return Err(AccountStateFailure::Expired);
        }
        if !self.account_non_locked {
            return Err(AccountStateFailure::Locked);
        }
        if !self.credentials_non_expired {
            return Err(AccountStateFailure::CredentialsExpired);
        }
        if !self.enabled {
            return Err(AccountStateFailure::Disabled);
        }
        Ok(())
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn locked() -> Self {
        Self {
            account_non_locked: false,
            ..Self::default()
        }
    }
}

/// Authenticated identity
#[derive(Debug, Clone)]
pub struct Principal {
    identifier: String,
    roles: HashSet<Role>,
    account: AccountStatus,
}

impl Principal {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
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

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn account(&self) -> AccountStatus {
        self.account
    }

    pub fn roles(&self) -> &HashSet<Role> {
        &self.roles
    }

    /// Add a role; returns false if it was already present
    pub fn add_role(&mut self, role: Role) -> bool {
        self.roles.insert(role)
    }

    /// Authority names held directly through roles
    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(Role::authority)
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities().any(|a| a == authority)
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Principal {}

impl Hash for Principal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}
