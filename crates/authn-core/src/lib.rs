//! Authentication Core
//!
//! Credential verification for the authentication backend:
//! - Argon2id password hashing with constant-time verification
//! - Credential stores (in-memory fixture and MongoDB)
//! - An authenticator producing principals or typed failures
//! - Role-based authorization over a principal's role set
//!
//! ## Module Organization
//!
//! - `role`, `principal`, `credential` - entities, plus stores for credentials
//! - `auth` - password service and authenticator
//! - `shared` - errors and authorization policy
//! - `seed` - startup provisioning
//!
//! HTTP transport lives in the server binary; nothing here depends on it.

pub mod role;
pub mod principal;
pub mod credential;
pub mod auth;
pub mod shared;
pub mod seed;

pub use shared::error::{AccountStateFailure, AuthError, AuthFailure, PasswordError, Result, StoreError};
pub use shared::authorization_policy::AuthorizationPolicy;

pub use role::entity::{authorities, Role};
pub use principal::entity::{AccountStatus, Principal};
pub use credential::entity::CredentialRecord;
pub use credential::store::{CredentialStore, SaveMode};
pub use credential::memory::InMemoryCredentialStore;
pub use credential::mongo::MongoCredentialStore;

pub use auth::password_service::{Argon2Config, PasswordService};
pub use auth::authenticator::Authenticator;

pub use seed::dev_seeder::{DevDataSeeder, SeedAccount};
