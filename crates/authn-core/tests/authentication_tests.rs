//! Authentication Integration Tests
//!
//! End-to-end checks of the core: seeded store, authenticator and
//! authorization policy working together.

use std::sync::Arc;
use std::time::{Duration, Instant};

use authn_core::{
    AccountStateFailure, AccountStatus, Argon2Config, AuthFailure, Authenticator,
    AuthorizationPolicy, CredentialRecord, CredentialStore, DevDataSeeder, InMemoryCredentialStore,
    PasswordService, Role, SaveMode, SeedAccount,
};

fn passwords() -> Arc<PasswordService> {
    Arc::new(PasswordService::new(Argon2Config::testing()).unwrap())
}

async fn seeded(accounts: &[SeedAccount]) -> (Arc<InMemoryCredentialStore>, Authenticator) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let passwords = passwords();
    DevDataSeeder::new(store.clone(), passwords.clone())
        .seed(accounts)
        .await
        .unwrap();
    let authenticator = Authenticator::new(store.clone(), passwords).unwrap();
    (store, authenticator)
}

mod hashing_tests {
    use super::*;

    #[test]
    fn test_verify_round_trip_for_varied_secrets() {
        let service = passwords();
        for secret in ["password", "", "pässwörd", "a:b:c", "   ", "x".repeat(200).as_str()] {
            let hash = service.hash_password(secret).unwrap();
            assert!(service.verify_password(secret, &hash), "secret {:?}", secret);
        }
    }

    #[test]
    fn test_different_secret_fails() {
        let service = passwords();
        let hash = service.hash_password("password").unwrap();
        for other in ["Password", "password ", "passwor", "wrong"] {
            assert!(!service.verify_password(other, &hash));
        }
    }
}

mod scenario_tests {
    use super::*;

    #[tokio::test]
    async fn test_ethan_authenticates_with_user_role() {
        let (_, auth) = seeded(&[SeedAccount::default_user()]).await;

        let principal = auth.authenticate("Ethan", "password").await.unwrap();
        let authorities: Vec<&str> = principal.authorities().collect();
        assert_eq!(authorities, vec!["USER"]);
        assert!(principal.roles().contains(&Role::new("1", "USER")));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_invalid_credential() {
        let (_, auth) = seeded(&[SeedAccount::default_user()]).await;
        assert_eq!(
            auth.authenticate("Ethan", "wrong").await.unwrap_err(),
            AuthFailure::InvalidCredential
        );
    }

    #[tokio::test]
    async fn test_unknown_identifier() {
        let (_, auth) = seeded(&[SeedAccount::default_user()]).await;
        assert_eq!(
            auth.authenticate("Nobody", "x").await.unwrap_err(),
            AuthFailure::UnknownPrincipal
        );
        assert_eq!(
            auth.authenticate("ethan", "password").await.unwrap_err(),
            AuthFailure::UnknownPrincipal
        );
    }

    #[tokio::test]
    async fn test_disabled_account_rejected() {
        let (_, auth) = seeded(&[
            SeedAccount::default_user().with_account(AccountStatus::disabled()),
        ])
        .await;

        assert_eq!(
            auth.authenticate("Ethan", "password").await.unwrap_err(),
            AuthFailure::AccountState(AccountStateFailure::Disabled)
        );
    }

    #[tokio::test]
    async fn test_user_is_not_admin() {
        let (_, auth) = seeded(&[SeedAccount::default_user()]).await;
        let principal = auth.authenticate("Ethan", "password").await.unwrap();
        let policy = AuthorizationPolicy::new();

        assert!(policy.is_authorized(&principal, "USER"));
        assert!(!policy.is_authorized(&principal, "ADMIN"));
    }

    #[tokio::test]
    async fn test_password_rotation_takes_effect() {
        let (store, auth) = seeded(&[SeedAccount::default_user()]).await;

        let record = store.find_by_identifier("Ethan").await.unwrap().unwrap();
        let rotated = record.with_password_hash(passwords().hash_password("new-password").unwrap());
        store.save(rotated, SaveMode::Upsert).await.unwrap();

        assert_eq!(
            auth.authenticate("Ethan", "password").await.unwrap_err(),
            AuthFailure::InvalidCredential
        );
        let principal = auth.authenticate("Ethan", "new-password").await.unwrap();
        assert!(principal.has_authority("USER"));
    }
}

mod property_tests {
    use super::*;

    #[tokio::test]
    async fn test_same_input_same_outcome() {
        let (_, auth) = seeded(&[
            SeedAccount::default_user(),
            SeedAccount::new("locked", "password").with_account(AccountStatus::locked()),
        ])
        .await;

        let attempts = [
            ("Ethan", "password"),
            ("Ethan", "wrong"),
            ("Nobody", "x"),
            ("locked", "password"),
        ];

        for (id, secret) in attempts {
            let first = auth.authenticate(id, secret).await;
            for _ in 0..3 {
                let again = auth.authenticate(id, secret).await;
                match (&first, &again) {
                    (Ok(a), Ok(b)) => {
                        assert_eq!(a, b);
                        assert_eq!(a.roles(), b.roles());
                    }
                    (Err(a), Err(b)) => assert_eq!(a, b),
                    _ => panic!("outcome changed for {}", id),
                }
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_authentication() {
        let (_, auth) = seeded(&[
            SeedAccount::default_user(),
            SeedAccount::new("admin", "admin-pass").with_role(Role::new("2", "ADMIN")),
        ])
        .await;
        let auth = Arc::new(auth);

        let mut tasks = Vec::new();
        for i in 0..16 {
            let auth = auth.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    auth.authenticate("Ethan", "password").await.map(|p| p.identifier().to_string())
                } else {
                    auth.authenticate("admin", "admin-pass").await.map(|p| p.identifier().to_string())
                }
            }));
        }

        for (i, task) in tasks.into_iter().enumerate() {
            let id = task.await.unwrap().unwrap();
            assert_eq!(id, if i % 2 == 0 { "Ethan" } else { "admin" });
        }
    }

    fn median(mut samples: Vec<Duration>) -> Duration {
        samples.sort();
        samples[samples.len() / 2]
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unknown_identifier_costs_as_much_as_wrong_secret() {
        let (_, auth) = seeded(&[SeedAccount::default_user()]).await;

        // warm up
        let _ = auth.authenticate("Nobody", "x").await;
        let _ = auth.authenticate("Ethan", "x").await;

        let mut unknown = Vec::new();
        let mut wrong = Vec::new();
        for _ in 0..15 {
            let start = Instant::now();
            let _ = auth.authenticate("Nobody", "guess").await;
            unknown.push(start.elapsed());

            let start = Instant::now();
            let _ = auth.authenticate("Ethan", "guess").await;
            wrong.push(start.elapsed());
        }

        let unknown = median(unknown).as_secs_f64();
        let wrong = median(wrong).as_secs_f64();
        let ratio = unknown / wrong;
        assert!(
            (0.5..2.0).contains(&ratio),
            "unknown={:.4}s wrong={:.4}s ratio={:.2}",
            unknown,
            wrong,
            ratio
        );
    }

    #[tokio::test]
    async fn test_record_mutation_never_leaks_into_principal() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let passwords = passwords();
        let hash = passwords.hash_password("password").unwrap();
        store
            .save(
                CredentialRecord::new("Ethan", hash).with_roles([Role::new("1", "USER")]),
                SaveMode::CreateOnly,
            )
            .await
            .unwrap();

        let auth = Authenticator::new(store.clone(), passwords).unwrap();
        let mut principal = auth.authenticate("Ethan", "password").await.unwrap();
        principal.add_role(Role::new("2", "ADMIN"));

        let record = store.find_by_identifier("Ethan").await.unwrap().unwrap();
        assert_eq!(record.roles().len(), 1);
    }
}
