//! Shared Module
//!
//! Error types and the authorization policy.

pub mod error;
pub mod authorization_policy;

pub use error::{AccountStateFailure, AuthError, AuthFailure, PasswordError, Result, StoreError};
pub use authorization_policy::AuthorizationPolicy;
