//! Application wiring
//!
//! Turns an [`AppConfig`] into the shared [`AppState`]: password service,
//! credential store, seed data, authenticator and authorization policy.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use authn_config::{AppConfig, AuthConfig, PasswordConfig, SeedUser, StoreBackend};
use authn_core::{
    AccountStatus, Argon2Config, Authenticator, AuthorizationPolicy, CredentialStore,
    DevDataSeeder, InMemoryCredentialStore, MongoCredentialStore, PasswordService, Role,
    SeedAccount,
};

const BACKOFF_MULTIPLIER: u32 = 2;

/// Bounded exponential backoff for store outages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            attempts: config.retry_attempts.max(1),
            initial_backoff: Duration::from_millis(config.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(config.retry_max_backoff_ms),
        }
    }

    /// Delay before retry `retry` (0-based), doubling up to the cap
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = BACKOFF_MULTIPLIER.saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

/// Shared state for the HTTP layer
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub policy: Arc<AuthorizationPolicy>,
    pub realm: Arc<str>,
    pub reveal_account_state: bool,
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn new(authenticator: Arc<Authenticator>, policy: AuthorizationPolicy, auth: &AuthConfig) -> Self {
        Self {
            authenticator,
            policy: Arc::new(policy),
            realm: Arc::from(auth.realm.as_str()),
            reveal_account_state: auth.reveal_account_state,
            retry: RetryPolicy::from_config(auth),
        }
    }
}

pub fn argon2_config(config: &PasswordConfig) -> Argon2Config {
    Argon2Config {
        memory_cost: config.memory_cost,
        time_cost: config.time_cost,
        parallelism: config.parallelism,
        output_len: config.output_len,
    }
}

pub fn seed_account(user: &SeedUser) -> SeedAccount {
    let account = AccountStatus {
        account_non_expired: user.account_non_expired,
        account_non_locked: user.account_non_locked,
        credentials_non_expired: user.credentials_non_expired,
        enabled: user.enabled,
    };

    user.roles.iter().fold(
        SeedAccount::new(&user.identifier, &user.password).with_account(account),
        |seed, role| seed.with_role(Role::new(&role.id, &role.authority)),
    )
}

/// Select the credential store backend
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn CredentialStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory credential store");
            Ok(Arc::new(InMemoryCredentialStore::new()))
        }
        StoreBackend::Mongodb => {
            info!("Connecting to MongoDB: {}/{}", config.mongodb.uri, config.mongodb.database);
            let client = mongodb::Client::with_uri_str(&config.mongodb.uri)
                .await
                .context("Invalid MongoDB connection string")?;
            let db = client.database(&config.mongodb.database);
            let store = MongoCredentialStore::new(&db, Duration::from_millis(config.store.timeout_ms));

            // An unreachable server at startup is an outage, not a fatal error.
            if let Err(e) = store.ensure_indexes().await {
                warn!(error = %e, "Index creation skipped");
            }
            Ok(Arc::new(store))
        }
    }
}

/// Build everything the router needs from configuration
pub async fn build_state(config: &AppConfig) -> Result<AppState> {
    let passwords = Arc::new(
        PasswordService::new(argon2_config(&config.password))
            .context("Invalid password hashing parameters")?,
    );
    let store = build_store(config).await?;

    if config.seed.enabled {
        let accounts: Vec<SeedAccount> = config.seed.users.iter().map(seed_account).collect();
        let seeder = DevDataSeeder::new(store.clone(), passwords.clone());
        match seeder.seed(&accounts).await {
            Ok(created) => info!(created, total = accounts.len(), "Seed accounts provisioned"),
            Err(e) => warn!("Seeding skipped (store may be unavailable): {}", e),
        }
    }

    let authenticator = Authenticator::new(store, passwords)
        .context("Failed to initialize authenticator")?;
    let policy = AuthorizationPolicy::with_implications(config.authorization.implied_roles.clone());

    Ok(AppState::new(Arc::new(authenticator), policy, &config.auth))
}
