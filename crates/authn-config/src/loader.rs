//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "authn.toml",
    "./config/config.toml",
    "./config/authn.toml",
    "/etc/authn/config.toml",
];

/// Env var naming an explicit config file
const CONFIG_PATH_ENV: &str = "AUTHN_CONFIG";

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found), apply `AUTHN_*` environment
    /// overrides, then validate.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with a custom variable source.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.find_config_file(&lookup) {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                AppConfig::from_file(&path)?
            }
            None => {
                info!("No configuration file found, using defaults");
                AppConfig::default()
            }
        };

        apply_overrides(&mut config, &lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured file does not exist, searching defaults");
        }

        if let Some(path) = lookup(CONFIG_PATH_ENV).map(PathBuf::from) {
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvError(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(None),
    }
}

fn apply_overrides<F>(config: &mut AppConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(val) = lookup("AUTHN_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(port) = parse_var(lookup, "AUTHN_HTTP_PORT")? {
        config.http.port = port;
    }

    // Store
    if let Some(backend) = parse_var(lookup, "AUTHN_STORE_BACKEND")? {
        config.store.backend = backend;
    }
    if let Some(timeout) = parse_var(lookup, "AUTHN_STORE_TIMEOUT_MS")? {
        config.store.timeout_ms = timeout;
    }

    // MongoDB
    if let Some(val) = lookup("AUTHN_MONGODB_URI") {
        config.mongodb.uri = val;
    }
    if let Some(val) = lookup("AUTHN_MONGODB_DATABASE") {
        config.mongodb.database = val;
    }

    // Password hashing
    if let Some(cost) = parse_var(lookup, "AUTHN_PASSWORD_MEMORY_COST")? {
        config.password.memory_cost = cost;
    }
    if let Some(cost) = parse_var(lookup, "AUTHN_PASSWORD_TIME_COST")? {
        config.password.time_cost = cost;
    }
    if let Some(lanes) = parse_var(lookup, "AUTHN_PASSWORD_PARALLELISM")? {
        config.password.parallelism = lanes;
    }

    // Auth
    if let Some(val) = lookup("AUTHN_AUTH_REALM") {
        config.auth.realm = val;
    }
    if let Some(reveal) = parse_var(lookup, "AUTHN_AUTH_REVEAL_ACCOUNT_STATE")? {
        config.auth.reveal_account_state = reveal;
    }
    if let Some(attempts) = parse_var(lookup, "AUTHN_AUTH_RETRY_ATTEMPTS")? {
        config.auth.retry_attempts = attempts;
    }

    // Seed
    if let Some(enabled) = parse_var(lookup, "AUTHN_SEED_ENABLED")? {
        config.seed.enabled = enabled;
    }

    Ok(())
}
