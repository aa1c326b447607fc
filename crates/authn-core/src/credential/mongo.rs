//! MongoDB Credential Store
//!
//! Users live in the `users` collection keyed by identifier and reference
//! their roles by id; role definitions live in the `roles` collection and
//! never change once written. A lookup resolves the user and its roles in a
//! single `$lookup` round trip. Every call is bounded by the configured
//! timeout and reports expiry or driver faults as
//! [`StoreError::Unavailable`].

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::credential::entity::CredentialRecord;
use crate::credential::store::{CredentialStore, SaveMode};
use crate::principal::entity::AccountStatus;
use crate::role::entity::Role;
use crate::shared::error::StoreError;

pub const USERS_COLLECTION: &str = "users";
pub const ROLES_COLLECTION: &str = "roles";

const DUPLICATE_KEY: i32 = 11000;

/// Stored shape of a user document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub identifier: String,

    pub password_hash: String,

    #[serde(default)]
    pub role_ids: Vec<String>,

    #[serde(default)]
    pub account: AccountStatus,
}

impl UserDocument {
    pub fn from_record(record: &CredentialRecord) -> Self {
        let mut role_ids: Vec<String> = record.roles().iter().map(|r| r.id().to_string()).collect();
        role_ids.sort();

        Self {
            identifier: record.identifier().to_string(),
            password_hash: record.password_hash().to_string(),
            role_ids,
            account: record.account(),
        }
    }

    /// Combine with resolved roles. Ids with no matching role document are
    /// dropped.
    pub fn into_record(self, roles: impl IntoIterator<Item = Role>) -> CredentialRecord {
        let wanted: HashSet<&str> = self.role_ids.iter().map(String::as_str).collect();
        let roles: Vec<Role> = roles.into_iter().filter(|r| wanted.contains(r.id())).collect();

        CredentialRecord::new(self.identifier, self.password_hash)
            .with_roles(roles)
            .with_account(self.account)
    }
}

/// A user document with its role documents joined in by `$lookup`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedUser {
    #[serde(rename = "_id")]
    identifier: String,
    password_hash: String,
    #[serde(default)]
    role_ids: Vec<String>,
    #[serde(default)]
    account: AccountStatus,
    #[serde(default)]
    roles: Vec<Role>,
}

impl ResolvedUser {
    fn into_record(self) -> CredentialRecord {
        if self.roles.len() < self.role_ids.len() {
            warn!(
                identifier = %self.identifier,
                expected = self.role_ids.len(),
                found = self.roles.len(),
                "User references roles that do not exist"
            );
        }

        let user = UserDocument {
            identifier: self.identifier,
            password_hash: self.password_hash,
            role_ids: self.role_ids,
            account: self.account,
        };
        user.into_record(self.roles)
    }
}

fn lookup_pipeline(identifier: &str) -> Vec<Document> {
    vec![
        doc! { "$match": { "_id": identifier } },
        doc! {
            "$lookup": {
                "from": ROLES_COLLECTION,
                "localField": "roleIds",
                "foreignField": "_id",
                "as": "roles",
            }
        },
        doc! { "$limit": 1 },
    ]
}

pub struct MongoCredentialStore {
    users: Collection<UserDocument>,
    roles: Collection<Role>,
    timeout: Duration,
}

impl MongoCredentialStore {
    pub fn new(db: &Database, timeout: Duration) -> Self {
        Self {
            users: db.collection(USERS_COLLECTION),
            roles: db.collection(ROLES_COLLECTION),
            timeout,
        }
    }

    /// Create the `roles.authority` index behind
    /// [`find_role_by_authority`](Self::find_role_by_authority). `_id`
    /// already enforces identifier uniqueness in both collections.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        self.bounded(async {
            self.roles
                .create_index(IndexModel::builder().keys(doc! { "authority": 1 }).build())
                .await?;

            info!("Created indexes on {}", ROLES_COLLECTION);
            Ok::<_, StoreError>(())
        })
        .await
    }

    /// The role definition carrying `authority`, if one exists
    pub async fn find_role_by_authority(&self, authority: &str) -> Result<Option<Role>, StoreError> {
        self.bounded(async {
            Ok::<_, StoreError>(self.roles.find_one(doc! { "authority": authority }).await?)
        })
        .await
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Credential store operation timed out");
                Err(StoreError::unavailable(format!(
                    "operation timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }

    async fn load_roles(&self, ids: &[String]) -> Result<Vec<Role>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self.roles.find(doc! { "_id": { "$in": ids } }).await?;
        let roles: Vec<Role> = cursor.try_collect().await?;
        Ok(roles)
    }

    /// Insert role definitions that do not exist yet and refuse any record
    /// that would bind a known role id to another authority.
    async fn define_roles(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        if record.roles().is_empty() {
            return Ok(());
        }

        for role in record.roles() {
            let inserted = self
                .roles
                .update_one(
                    doc! { "_id": role.id() },
                    doc! { "$setOnInsert": { "authority": role.authority() } },
                )
                .upsert(true)
                .await;

            // A concurrent upsert of the same id loses with a duplicate key;
            // the definition exists either way and is checked below.
            if let Err(e) = inserted {
                if !is_duplicate_key(&e) {
                    return Err(e.into());
                }
            }
        }

        let ids: Vec<String> = record.roles().iter().map(|r| r.id().to_string()).collect();
        let stored = self.load_roles(&ids).await?;

        for role in record.roles() {
            if let Some(existing) = stored.iter().find(|s| s.id() == role.id()) {
                if existing.authority() != role.authority() {
                    warn!(
                        role_id = %role.id(),
                        existing = %existing.authority(),
                        requested = %role.authority(),
                        "Refusing to redefine role"
                    );
                    return Err(StoreError::role_conflict(role.id(), existing.authority(), role.authority()));
                }
            }
        }
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl CredentialStore for MongoCredentialStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>, StoreError> {
        self.bounded(async {
            let mut cursor = self.users.aggregate(lookup_pipeline(identifier)).await?;
            let Some(document) = cursor.try_next().await? else {
                return Ok(None);
            };

            let resolved: ResolvedUser = bson::from_document(document).map_err(|e| {
                StoreError::unavailable(format!("Malformed user document: {}", e))
            })?;
            Ok::<_, StoreError>(Some(resolved.into_record()))
        })
        .await
    }

    async fn save(&self, record: CredentialRecord, mode: SaveMode) -> Result<(), StoreError> {
        self.bounded(async {
            if mode == SaveMode::CreateOnly
                && self
                    .users
                    .find_one(doc! { "_id": record.identifier() })
                    .await?
                    .is_some()
            {
                return Err(StoreError::conflict(record.identifier()));
            }

            // Role documents are immutable, so defining them ahead of the
            // user keeps every reference resolvable once the user lands.
            self.define_roles(&record).await?;

            let user = UserDocument::from_record(&record);
            match mode {
                SaveMode::CreateOnly => {
                    if let Err(e) = self.users.insert_one(&user).await {
                        if is_duplicate_key(&e) {
                            return Err(StoreError::conflict(record.identifier()));
                        }
                        return Err(e.into());
                    }
                }
                SaveMode::Upsert => {
                    self.users
                        .replace_one(doc! { "_id": user.identifier.as_str() }, &user)
                        .upsert(true)
                        .await?;
                }
            }

            debug!(identifier = %record.identifier(), ?mode, "Credential record saved");
            Ok::<_, StoreError>(())
        })
        .await
    }
}
