//! Authentication Error Types

use thiserror::Error;

/// Why an account with a matching credential was still refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStateFailure {
    #[error("account expired")]
    Expired,

    #[error("account locked")]
    Locked,

    #[error("credentials expired")]
    CredentialsExpired,

    #[error("account disabled")]
    Disabled,
}

impl AccountStateFailure {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Expired => "ACCOUNT_EXPIRED",
            Self::Locked => "ACCOUNT_LOCKED",
            Self::CredentialsExpired => "CREDENTIALS_EXPIRED",
            Self::Disabled => "ACCOUNT_DISABLED",
        }
    }
}

/// Outcome of a rejected authentication attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Unknown principal")]
    UnknownPrincipal,

    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Account state rejected: {0}")]
    AccountState(AccountStateFailure),

    #[error("Credential store unavailable: {message}")]
    StoreUnavailable { message: String },
}

impl AuthFailure {
    /// Only store outages are worth retrying; every other kind is final
    /// for the attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownPrincipal => "unknown_principal",
            Self::InvalidCredential => "invalid_credential",
            Self::AccountState(_) => "account_state",
            Self::StoreUnavailable { .. } => "store_unavailable",
        }
    }
}

impl From<StoreError> for AuthFailure {
    fn from(err: StoreError) -> Self {
        AuthFailure::StoreUnavailable {
            message: err.to_string(),
        }
    }
}

/// Credential store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Principal already exists: {identifier}")]
    Conflict { identifier: String },

    /// Roles are immutable once created; a role id cannot be rebound to a
    /// different authority.
    #[error("Role {id} is already defined as {existing}, not {requested}")]
    RoleConflict {
        id: String,
        existing: String,
        requested: String,
    },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn conflict(identifier: impl Into<String>) -> Self {
        Self::Conflict { identifier: identifier.into() }
    }

    pub fn role_conflict(
        id: impl Into<String>,
        existing: impl Into<String>,
        requested: impl Into<String>,
    ) -> Self {
        Self::RoleConflict {
            id: id.into(),
            existing: existing.into(),
            requested: requested.into(),
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::unavailable(err.to_string())
    }
}

/// Internal password hashing failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Malformed password hash: {message}")]
    MalformedHash { message: String },

    #[error("Password hashing failed: {message}")]
    Hashing { message: String },
}

/// Construction and provisioning errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
