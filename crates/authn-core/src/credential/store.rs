//! Credential Store Abstraction

use async_trait::async_trait;

use crate::credential::entity::CredentialRecord;
use crate::shared::error::StoreError;

/// Write semantics for [`CredentialStore::save`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveMode {
    /// Insert or replace the record with the same identifier
    #[default]
    Upsert,
    /// Fail with [`StoreError::Conflict`] if the identifier exists
    CreateOnly,
}

/// Lookup and provisioning of credential records.
///
/// Identifiers match exactly and case-sensitively. A save replaces the whole
/// record in one step, so concurrent readers observe either the previous or
/// the new record, never a mix.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Absent identifiers are `Ok(None)`, not an error.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>, StoreError>;

    async fn save(&self, record: CredentialRecord, mode: SaveMode) -> Result<(), StoreError>;
}
