//! Authentication Backend Configuration
//!
//! TOML-based configuration with environment variable overrides. Every
//! section has working defaults, so an empty file (or no file at all) starts
//! an in-memory server seeded with the development user.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub store: StoreConfig,
    pub mongodb: MongoConfig,
    pub password: PasswordConfig,
    pub authorization: AuthorizationConfig,
    pub auth: AuthConfig,
    pub seed: SeedConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::ValidationError("http.port must be non-zero".into()));
        }
        if self.store.timeout_ms == 0 {
            return Err(ConfigError::ValidationError("store.timeout_ms must be non-zero".into()));
        }
        if self.store.backend == StoreBackend::Mongodb {
            if self.mongodb.uri.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "mongodb.uri is required when store.backend = \"mongodb\"".into(),
                ));
            }
            if self.mongodb.database.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "mongodb.database is required when store.backend = \"mongodb\"".into(),
                ));
            }
        }

        let p = &self.password;
        if p.memory_cost == 0 || p.time_cost == 0 || p.parallelism == 0 {
            return Err(ConfigError::ValidationError(
                "password.memory_cost, time_cost and parallelism must be non-zero".into(),
            ));
        }
        if p.output_len < 16 {
            return Err(ConfigError::ValidationError(
                "password.output_len must be at least 16 bytes".into(),
            ));
        }

        if self.auth.retry_attempts == 0 {
            return Err(ConfigError::ValidationError("auth.retry_attempts must be at least 1".into()));
        }
        if self.auth.retry_initial_backoff_ms > self.auth.retry_max_backoff_ms {
            return Err(ConfigError::ValidationError(
                "auth.retry_initial_backoff_ms exceeds auth.retry_max_backoff_ms".into(),
            ));
        }

        for (role, implied) in &self.authorization.implied_roles {
            if role.trim().is_empty() || implied.iter().any(|r| r.trim().is_empty()) {
                return Err(ConfigError::ValidationError(
                    "authorization.implied_roles contains an empty role name".into(),
                ));
            }
        }

        for user in &self.seed.users {
            if user.identifier.is_empty() {
                return Err(ConfigError::ValidationError("seed user with empty identifier".into()));
            }
            if user.roles.iter().any(|r| r.id.is_empty() || r.authority.is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "seed user '{}' has a role with an empty id or authority",
                    user.identifier
                )));
            }
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Which credential store implementation backs authentication
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Mongodb,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            other => Err(ConfigError::EnvError(format!("unknown store backend: {}", other))),
        }
    }
}

/// Credential store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Upper bound for a single store operation
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            timeout_ms: 2000,
        }
    }
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "authentication".to_string(),
        }
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    /// Output hash length in bytes
    pub output_len: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

/// Role implication mapping, e.g. `ADMIN = ["USER"]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    pub implied_roles: HashMap<String, Vec<String>>,
}

/// Transport-level authentication behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Realm advertised in `WWW-Authenticate`
    pub realm: String,
    /// Return distinct codes for locked/disabled/expired accounts
    pub reveal_account_state: bool,
    /// Attempts per request when the store is unavailable
    pub retry_attempts: u32,
    pub retry_initial_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            realm: "authentication-backend".to_string(),
            reveal_account_state: false,
            retry_attempts: 3,
            retry_initial_backoff_ms: 50,
            retry_max_backoff_ms: 400,
        }
    }
}

/// Users provisioned at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,
    pub users: Vec<SeedUser>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            users: vec![SeedUser {
                identifier: "Ethan".to_string(),
                password: "password".to_string(),
                roles: vec![SeedRole {
                    id: "1".to_string(),
                    authority: "USER".to_string(),
                }],
                ..SeedUser::default()
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedUser {
    pub identifier: String,
    pub password: String,
    pub roles: Vec<SeedRole>,
    pub account_non_expired: bool,
    pub account_non_locked: bool,
    pub credentials_non_expired: bool,
    pub enabled: bool,
}

impl Default for SeedUser {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            password: String::new(),
            roles: Vec::new(),
            account_non_expired: true,
            account_non_locked: true,
            credentials_non_expired: true,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRole {
    pub id: String,
    pub authority: String,
}
