//! MongoDB Credential Store Integration Tests
//!
//! Runs against `AUTHN_TEST_MONGODB_URI` when set, otherwise against a
//! throwaway container. Without either, the tests return early.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use testcontainers_modules::mongo::Mongo;
use testcontainers_modules::testcontainers::{runners::AsyncRunner, ContainerAsync};

use authn_core::{
    AccountStatus, CredentialRecord, CredentialStore, MongoCredentialStore, Role, SaveMode,
    StoreError,
};

const MONGODB_URI_ENV: &str = "AUTHN_TEST_MONGODB_URI";

static DATABASE_SEQ: AtomicU32 = AtomicU32::new(0);

struct TestMongo {
    store: MongoCredentialStore,
    _container: Option<ContainerAsync<Mongo>>,
}

async fn test_mongo() -> Option<TestMongo> {
    let (uri, container) = match std::env::var(MONGODB_URI_ENV) {
        Ok(uri) => (uri, None),
        Err(_) => match Mongo::default().start().await {
            Ok(container) => {
                let host = container.get_host().await.ok()?;
                let port = container.get_host_port_ipv4(27017).await.ok()?;
                (format!("mongodb://{}:{}", host, port), Some(container))
            }
            Err(e) => {
                eprintln!("MongoDB unavailable, skipping: {}", e);
                return None;
            }
        },
    };

    let client = mongodb::Client::with_uri_str(&uri).await.ok()?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let name = format!(
        "authn_test_{}_{}_{}",
        std::process::id(),
        DATABASE_SEQ.fetch_add(1, Ordering::SeqCst),
        nanos
    );

    let store = MongoCredentialStore::new(&client.database(&name), Duration::from_secs(10));
    Some(TestMongo {
        store,
        _container: container,
    })
}

fn ethan(hash: &str) -> CredentialRecord {
    CredentialRecord::new("Ethan", hash).with_roles([Role::new("1", "USER")])
}

#[tokio::test]
async fn test_round_trip_resolves_roles() {
    let Some(mongo) = test_mongo().await else { return };
    let store = &mongo.store;
    store.ensure_indexes().await.unwrap();

    let record = CredentialRecord::new("root", "h")
        .with_roles([Role::new("1", "USER"), Role::new("2", "ADMIN")])
        .with_account(AccountStatus::locked());
    store.save(record.clone(), SaveMode::CreateOnly).await.unwrap();

    let found = store.find_by_identifier("root").await.unwrap().unwrap();
    assert_eq!(found, record);

    assert!(store.find_by_identifier("Nobody").await.unwrap().is_none());
    assert!(store.find_by_identifier("ROOT").await.unwrap().is_none());

    assert_eq!(
        store.find_role_by_authority("ADMIN").await.unwrap(),
        Some(Role::new("2", "ADMIN"))
    );
    assert!(store.find_role_by_authority("AUDITOR").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_only_conflict() {
    let Some(mongo) = test_mongo().await else { return };
    let store = &mongo.store;

    store.save(ethan("h1"), SaveMode::CreateOnly).await.unwrap();
    let err = store.save(ethan("h2"), SaveMode::CreateOnly).await.unwrap_err();
    assert_eq!(err, StoreError::conflict("Ethan"));

    let found = store.find_by_identifier("Ethan").await.unwrap().unwrap();
    assert_eq!(found.password_hash(), "h1");
}

#[tokio::test]
async fn test_conflicting_create_defines_no_roles() {
    let Some(mongo) = test_mongo().await else { return };
    let store = &mongo.store;

    store.save(ethan("h1"), SaveMode::CreateOnly).await.unwrap();

    let duplicate = CredentialRecord::new("Ethan", "h2").with_roles([Role::new("7", "AUDITOR")]);
    assert!(matches!(
        store.save(duplicate, SaveMode::CreateOnly).await,
        Err(StoreError::Conflict { .. })
    ));
    assert!(store.find_role_by_authority("AUDITOR").await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_replaces_whole_record() {
    let Some(mongo) = test_mongo().await else { return };
    let store = &mongo.store;

    store.save(ethan("h1"), SaveMode::Upsert).await.unwrap();

    let replacement = CredentialRecord::new("Ethan", "h2")
        .with_roles([Role::new("2", "ADMIN")])
        .with_account(AccountStatus::disabled());
    store.save(replacement.clone(), SaveMode::Upsert).await.unwrap();

    let found = store.find_by_identifier("Ethan").await.unwrap().unwrap();
    assert_eq!(found, replacement);
}

#[tokio::test]
async fn test_role_cannot_be_redefined() {
    let Some(mongo) = test_mongo().await else { return };
    let store = &mongo.store;

    store.save(ethan("h1"), SaveMode::CreateOnly).await.unwrap();

    let escalation = CredentialRecord::new("mallory", "h2").with_roles([Role::new("1", "ADMIN")]);
    let err = store.save(escalation, SaveMode::Upsert).await.unwrap_err();
    assert_eq!(err, StoreError::role_conflict("1", "USER", "ADMIN"));

    assert!(store.find_by_identifier("mallory").await.unwrap().is_none());
    let ethan = store.find_by_identifier("Ethan").await.unwrap().unwrap();
    assert!(ethan.roles().contains(&Role::new("1", "USER")));
    assert!(!ethan.to_principal().has_authority("ADMIN"));

    // Sharing a role under its own authority is fine
    let peer = CredentialRecord::new("peer", "h3").with_roles([Role::new("1", "USER")]);
    store.save(peer, SaveMode::CreateOnly).await.unwrap();
}
