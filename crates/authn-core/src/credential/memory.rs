//! In-Memory Credential Store
//!
//! Fixture store for development and tests. Records sit behind `Arc`s in a
//! sharded map and are swapped whole on save. Role definitions are shared
//! across records the same way the MongoDB store shares them: the first
//! save of a role id fixes its authority.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::credential::entity::CredentialRecord;
use crate::credential::store::{CredentialStore, SaveMode};
use crate::role::entity::Role;
use crate::shared::error::StoreError;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: DashMap<String, Arc<CredentialRecord>>,
    /// role id -> authority
    roles: DashMap<String, String>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with records (later duplicates win)
    pub fn with_records(records: impl IntoIterator<Item = CredentialRecord>) -> Self {
        let store = Self::new();
        for record in records {
            for role in record.roles() {
                store
                    .roles
                    .insert(role.id().to_string(), role.authority().to_string());
            }
            store
                .records
                .insert(record.identifier().to_string(), Arc::new(record));
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Register unseen roles and reject any that rebind a known id.
    fn define_roles<'a>(&self, roles: impl IntoIterator<Item = &'a Role>) -> Result<(), StoreError> {
        for role in roles {
            match self.roles.entry(role.id().to_string()) {
                Entry::Occupied(existing) if existing.get() != role.authority() => {
                    warn!(role_id = %role.id(), existing = %existing.get(), requested = %role.authority(), "Refusing to redefine role");
                    return Err(StoreError::role_conflict(role.id(), existing.get().as_str(), role.authority()));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(role.authority().to_string());
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self
            .records
            .get(identifier)
            .map(|entry| CredentialRecord::clone(entry.value())))
    }

    async fn save(&self, record: CredentialRecord, mode: SaveMode) -> Result<(), StoreError> {
        let identifier = record.identifier().to_string();
        match (self.records.entry(identifier.clone()), mode) {
            (Entry::Occupied(_), SaveMode::CreateOnly) => {
                return Err(StoreError::conflict(identifier));
            }
            (Entry::Occupied(mut slot), SaveMode::Upsert) => {
                self.define_roles(record.roles())?;
                slot.insert(Arc::new(record));
            }
            (Entry::Vacant(slot), _) => {
                self.define_roles(record.roles())?;
                slot.insert(Arc::new(record));
            }
        }

        debug!(identifier = %identifier, ?mode, "Credential record saved");
        Ok(())
    }
}
